//! Runner error type.

use mobsim_common::SimError;
use thiserror::Error;

/// Errors that can occur while loading or running a scenario.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Sim(#[from] SimError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RunnerError {
    /// Returns the engine error, if this wraps one.
    pub fn as_sim(&self) -> Option<&SimError> {
        match self {
            RunnerError::Sim(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for runner operations.
pub type Result<T> = std::result::Result<T, RunnerError>;
