//! Error types for model loading and inference.

use thiserror::Error;

/// A model could not be made ready.
///
/// Cloneable so a single failed load can be reported to every caller that
/// was waiting on it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("failed to load {model} model: {reason}")]
    LoadFailed { model: String, reason: String },

    #[error("{model} model load stopped before reporting a result")]
    LoadAbandoned { model: String },
}

impl ModelError {
    pub fn load_failed(model: impl Into<String>, reason: impl ToString) -> Self {
        ModelError::LoadFailed {
            model: model.into(),
            reason: reason.to_string(),
        }
    }
}

/// Running a ready model failed
#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("inference rpc failed: {0}")]
    Rpc(#[from] tonic::Status),

    #[error("malformed model output: {0}")]
    MalformedOutput(String),
}
