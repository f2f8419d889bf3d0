//! Error types for the recommendation pipeline.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// Caller-supplied parameters were rejected
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("filter {filter} failed: {source}")]
    Filter {
        filter: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, RecommendError>;
