//! Error types for configuration generation.

use thiserror::Error;

/// Result type alias for generator operations.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors that can occur while rendering a configuration document.
///
/// Emission itself never fails for a structurally valid graph; the only
/// fallible step is serialization.
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
