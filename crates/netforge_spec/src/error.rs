//! Error types for the spec module.

use thiserror::Error;

/// Result type alias for spec operations.
pub type SpecResult<T> = Result<T, SpecError>;

/// Errors that can occur while reading a topology spec.
#[derive(Error, Debug)]
pub enum SpecError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}
