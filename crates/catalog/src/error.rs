//! Error types for the catalog crate.
//!
//! Every way a catalog can fail to load is a variant here, so callers can
//! tell a missing file apart from a malformed line or a duplicated id.

use thiserror::Error;

use crate::types::ItemId;

/// Errors that can occur while loading or building a catalog
#[derive(Error, Debug)]
pub enum CatalogError {
    /// File could not be found or opened
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading file
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Line in a catalog file couldn't be parsed
    #[error("Parse error at line {line} in {file}: {reason}")]
    ParseError {
        file: String,
        line: usize,
        reason: String,
    },

    /// A field had an invalid value
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    /// Expected number of fields in a line doesn't match actual
    #[error("Expected {expected} fields but found {found} in line {line}")]
    FieldCountMismatch {
        expected: usize,
        found: usize,
        line: usize,
    },

    /// Two catalog entries share the same id
    #[error("Duplicate catalog item id {id}")]
    DuplicateId { id: ItemId },

    /// JSON catalog could not be decoded
    #[error("Invalid JSON catalog: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Convenience type alias for Results in this crate
pub type Result<T> = std::result::Result<T, CatalogError>;
