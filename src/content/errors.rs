//! Content error types

use thiserror::Error;

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

/// Content errors
#[derive(Debug, Clone, Error)]
pub enum ContentError {
    /// The value contains a scalar JSON cannot represent.
    #[error("content cannot be serialized: {0}")]
    InvalidContent(String),

    /// The input is not valid JSON.
    #[error("content is not valid JSON: {0}")]
    Parse(String),
}
