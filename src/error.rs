//! Error types for engine calls and startup configuration.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The call ran out of budget, either queued or running.
    Timeout,
    /// The solver could not be started, failed, or vanished mid-call.
    Process,
    /// The solver's output was not the expected JSON.
    Decode,
    /// The engine no longer accepts calls.
    Closed,
}

/// Failure of a single engine call.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("timed out waiting for a free worker")]
    QueueTimeout,

    #[error("solver did not finish before its deadline")]
    ExecutionTimeout,

    #[error("failed to start solver: {0}")]
    Spawn(#[source] io::Error),

    #[error("solver exited with {status}: {stderr}")]
    Exited { status: ExitStatus, stderr: String },

    #[error("solver i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("malformed solver output: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("engine is closed")]
    Closed,

    #[error("worker dropped the call without a result")]
    WorkerLost,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QueueTimeout | Self::ExecutionTimeout => ErrorKind::Timeout,
            Self::Spawn(_) | Self::Exited { .. } | Self::Io(_) | Self::WorkerLost => {
                ErrorKind::Process
            }
            Self::Decode(_) => ErrorKind::Decode,
            Self::Closed => ErrorKind::Closed,
        }
    }

    /// True when the caller should report "temporarily unavailable"
    /// rather than an internal error.
    pub fn is_timeout(&self) -> bool {
        self.kind() == ErrorKind::Timeout
    }
}

/// Startup configuration failure. Never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    ParseToml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid engine config: {0}")]
    Invalid(String),

    #[error("solver executable '{path}' is not accessible: {source}")]
    ExecMissing {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("solver executable '{path}' is not a regular file")]
    NotRegularFile { path: PathBuf },

    #[error("solver executable '{path}' has mode {mode:o}, must be 0755 or stricter")]
    TooPermissive { path: PathBuf, mode: u32 },

    #[error("solver executable '{path}' is owned by {uid}:{gid}, expected {want_uid}:{want_gid}")]
    WrongOwner {
        path: PathBuf,
        uid: u32,
        gid: u32,
        want_uid: u32,
        want_gid: u32,
    },
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn parse_toml(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseToml {
            path: path.into(),
            source,
        }
    }
}
