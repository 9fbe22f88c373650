//! Search provider error types

use thiserror::Error;

/// Result type for search provider operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Search provider errors
///
/// Indexing failures are soft with respect to the write path: the revision
/// they concern is already committed and stays committed.
#[derive(Debug, Clone, Error)]
pub enum SearchError {
    /// The target index does not exist and the provider will not create it.
    #[error("search index '{0}' does not exist")]
    MissingIndex(String),

    /// The back-end refused or failed the call.
    #[error("search backend failure: {0}")]
    Backend(String),
}
