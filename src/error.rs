use crate::domain::snapshot::LogEntry;
use thiserror::Error;

/// Replay harness error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid resolution: {reason}")]
    InvalidResolution { reason: String },

    #[error("Did not find pending entry {name}")]
    EntryNotFound { name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_resolution(reason: impl Into<String>) -> Self {
        Self::InvalidResolution {
            reason: reason.into(),
        }
    }

    pub fn entry_not_found(name: impl Into<String>) -> Self {
        Self::EntryNotFound { name: name.into() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// A run that failed during simulation, with the log recorded up to the failure
#[derive(Error, Debug)]
#[error("Snapshot run failed after {} log entries: {error}", .log.len())]
pub struct RunFailure {
    #[source]
    pub error: Error,
    pub log: Vec<LogEntry>,
}
