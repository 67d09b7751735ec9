use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tracing::{debug, info};

use super::Engine;
use crate::config::EngineConfig;
use crate::consts::WORD_LIST_TIMEOUT;
use crate::error::{ConfigError, EngineError};
use crate::invoker::Invoker;
use crate::scheduler::Scheduler;
use crate::trust::{TrustPolicy, default_policy};
use crate::types::WordReport;

/// Engine backed by the external solver executable.
///
/// Every call gets one deadline, `now + budget`, shared by the wait for a
/// free worker and the solver run itself, so no call outlives its budget.
pub struct ProcessEngine {
    invoker: Arc<Invoker>,
    scheduler: Scheduler,
    solve_timeout: Duration,
    coach_timeout: Duration,
}

impl ProcessEngine {
    /// Verify the executable with the platform's default trust policy and
    /// start the worker pool. Must be called inside a tokio runtime.
    pub fn new(config: &EngineConfig) -> Result<Self, ConfigError> {
        Self::with_policy(config, default_policy().as_ref())
    }

    pub fn with_policy(
        config: &EngineConfig,
        policy: &dyn TrustPolicy,
    ) -> Result<Self, ConfigError> {
        policy.verify(&config.exec_path)?;

        let invoker = Arc::new(Invoker::new(&config.exec_path, &config.index_path));
        let scheduler = Scheduler::new(config.max_concurrent_calls);

        info!(
            exec = %config.exec_path.display(),
            workers = config.max_concurrent_calls,
            "engine ready"
        );

        Ok(Self {
            invoker,
            scheduler,
            solve_timeout: config.solve_timeout(),
            coach_timeout: config.coach_timeout(),
        })
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Stop accepting calls. In-flight calls finish or time out as usual.
    pub fn close(&self) {
        self.scheduler.close();
    }

    pub async fn shutdown(&self) {
        self.scheduler.shutdown().await;
        info!(exec = %self.invoker.exec_path().display(), "engine shut down");
    }

    async fn call<T>(&self, budget: Duration, args: Vec<String>) -> Result<T, EngineError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let started = Instant::now();
        let deadline = started + budget;
        let command = args.first().cloned().unwrap_or_default();
        debug!(%command, budget_ms = budget.as_millis() as u64, "submitting solver call");

        let invoker = Arc::clone(&self.invoker);
        let result = self
            .scheduler
            .submit(deadline, async move { invoker.invoke::<T>(deadline, &args).await })
            .await;

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(%command, elapsed_ms, "solver call done"),
            Err(e) => debug!(%command, elapsed_ms, error = %e, "solver call failed"),
        }
        result
    }
}

fn solve_args(word: &str) -> Vec<String> {
    vec!["solve".to_string(), "-t".to_string(), word.to_string()]
}

fn coach_args(word: &str, guesses: &[String]) -> Vec<String> {
    let mut args = vec!["coach".to_string(), "-t".to_string(), word.to_string()];
    args.extend(guesses.iter().cloned());
    args
}

fn list_args() -> Vec<String> {
    vec!["list".to_string(), "all".to_string()]
}

#[async_trait]
impl Engine for ProcessEngine {
    async fn solve(&self, word: &str) -> Result<Vec<WordReport>, EngineError> {
        self.call(self.solve_timeout, solve_args(word)).await
    }

    async fn coach(&self, word: &str, guesses: &[String]) -> Result<WordReport, EngineError> {
        self.call(self.coach_timeout, coach_args(word, guesses)).await
    }

    async fn word_list(&self) -> Result<Vec<String>, EngineError> {
        self.call(WORD_LIST_TIMEOUT, list_args()).await
    }
}
