//! Document error types

use thiserror::Error;

use crate::content::ContentError;
use crate::object_store::StoreError;
use crate::search::SearchError;

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Document errors
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The document id does not resolve to an existing store.
    #[error("document '{0}' does not exist")]
    NotFound(String),

    /// `promote` was called with a source state that has no tip.
    #[error("state '{0}' has no revision to promote from")]
    MissingSource(String),

    /// The branch tip moved underneath this write. Re-read the tip and
    /// retry.
    #[error("concurrent write on state '{0}'")]
    ConcurrentWrite(String),

    /// Stored data failed to parse. The operation did not mutate any ref.
    #[error("corrupt document data: {0}")]
    Corruption(String),

    /// The search provider call failed. The revision named here is
    /// committed and its branch tip stands; only the search projection is
    /// behind.
    #[error("search indexing failed for revision {revision_id} (the write stands): {source}")]
    IndexingFailed {
        revision_id: String,
        source: SearchError,
    },

    /// The document index file could not be read or written.
    #[error("document index error: {0}")]
    Index(String),

    /// The content buffer cannot be serialized.
    #[error(transparent)]
    InvalidContent(#[from] ContentError),

    /// Object store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}
