//! Object store error types

use thiserror::Error;

use super::object::ObjectId;

/// Result type for object store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Object store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store exists at the given location.
    #[error("object store not found: {0}")]
    NotFound(String),

    /// Compare-and-swap on a ref lost: the current tip differs from the
    /// expected one.
    #[error("ref '{name}' is stale: expected {expected:?}, found {found:?}")]
    RefStale {
        name: String,
        expected: Option<ObjectId>,
        found: Option<ObjectId>,
    },

    /// Another writer holds the lock for this ref.
    #[error("ref '{0}' is locked by another writer")]
    RefLocked(String),

    /// A stored object failed to parse or its digest does not match its id.
    #[error("corrupt object {id}: {reason}")]
    Corruption { id: String, reason: String },

    /// An object could not be assembled from the given parts.
    #[error("invalid object: {0}")]
    InvalidObject(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}
