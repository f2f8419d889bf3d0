//! Errors that cross the orchestrator boundary.

use pipeline::RecommendError;
use thiserror::Error;
use vision::ModelError;

/// Which side of a request a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Bad request parameters (HTTP 4xx)
    Client,
    /// Anything else (HTTP 5xx)
    Server,
}

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(#[from] ModelError),

    #[error("recommendation failed: {0}")]
    Internal(String),
}

impl OrchestratorError {
    pub fn class(&self) -> ErrorClass {
        match self {
            OrchestratorError::InvalidInput(_) => ErrorClass::Client,
            OrchestratorError::ModelUnavailable(_) | OrchestratorError::Internal(_) => {
                ErrorClass::Server
            }
        }
    }
}

impl From<RecommendError> for OrchestratorError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::InvalidInput(reason) => OrchestratorError::InvalidInput(reason),
            other => OrchestratorError::Internal(other.to_string()),
        }
    }
}
