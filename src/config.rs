//! Server configuration loaded from TOML.
//!
//! ```toml
//! [engine]
//! exec_path = "/usr/local/bin/wordsmith"
//! index_path = "/var/lib/wordsmith/index"
//! max_concurrent_users = 4
//! solve_timeout = 5000
//! coach_timeout = 2000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub engine: EngineConfig,
}

impl ServerConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config: Self = toml::from_str(&text).map_err(|e| ConfigError::parse_toml(path, e))?;
        config.engine.validate()?;
        Ok(config)
    }
}

/// Settings for the solver engine. Timeouts are in milliseconds on disk.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub exec_path: PathBuf,
    pub index_path: PathBuf,
    #[serde(rename = "max_concurrent_users")]
    pub max_concurrent_calls: usize,
    #[serde(rename = "solve_timeout")]
    pub solve_timeout_ms: u64,
    #[serde(rename = "coach_timeout")]
    pub coach_timeout_ms: u64,
}

impl EngineConfig {
    pub fn solve_timeout(&self) -> Duration {
        Duration::from_millis(self.solve_timeout_ms)
    }

    pub fn coach_timeout(&self) -> Duration {
        Duration::from_millis(self.coach_timeout_ms)
    }

    /// Reject values that would leave the engine unable to serve anything.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_calls == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_users must be at least 1".to_string(),
            ));
        }
        if self.solve_timeout_ms == 0 || self.coach_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "solve_timeout and coach_timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}
