use serde::{Deserialize, Serialize};

/// A candidate word and the solver's score for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guess {
    pub word: String,
    pub score: f32,
}

/// The solver's analysis of one turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordReport {
    /// The guess that was actually played.
    pub user: Guess,
    /// Best guesses available at this turn, best first.
    pub best: Vec<Guess>,
    #[serde(rename = "optionsLeft")]
    pub options_left: Vec<String>,
    pub eliminated: i32,
    pub colors: String,
}
