pub mod process;

use async_trait::async_trait;

use crate::error::EngineError;
use crate::types::WordReport;

/// The outermost boundary. Whatever serves requests only knows this trait.
///
/// Inputs are trusted: callers validate words and guesses beforehand.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Solve `word` from scratch, one report per turn.
    async fn solve(&self, word: &str) -> Result<Vec<WordReport>, EngineError>;

    /// Report on the `guesses` played so far against target `word`.
    async fn coach(&self, word: &str, guesses: &[String]) -> Result<WordReport, EngineError>;

    /// Every word the solver knows.
    async fn word_list(&self) -> Result<Vec<String>, EngineError>;
}
