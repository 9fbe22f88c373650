//! Search provider interface
//!
//! The store pushes every successfully committed revision to a search
//! provider, which keeps a queryable projection of the latest revision in
//! each state. The provider is a plug point: the core only requires that
//! `index` be called after each successful write, with the event that
//! caused it. Read paths (`list`, `search`) are delegated entirely to the
//! provider.
//!
//! Two local implementations ship with the crate: `NullSearch`, an
//! explicit no-op so the notification points need no None-checks, and
//! `MemorySearch`, an in-memory projection for tests and embedded use.

mod errors;
mod memory;
mod null;

pub use errors::{SearchError, SearchResult};
pub use memory::MemorySearch;
pub use null::NullSearch;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::object_store::Author;

/// What kind of write produced a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Save,
    Promotion,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Save => "save",
            EventKind::Promotion => "promotion",
        }
    }
}

/// The event attached to an indexing call: what happened, and on which
/// state branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEvent {
    pub name: EventKind,
    pub to: String,
}

impl IndexEvent {
    pub fn save(to: impl Into<String>) -> Self {
        IndexEvent { name: EventKind::Save, to: to.into() }
    }

    pub fn promotion(to: impl Into<String>) -> Self {
        IndexEvent { name: EventKind::Promotion, to: to.into() }
    }
}

/// Per-document-type search configuration: which index and type name to
/// write under, and an optional back-end-specific attribute mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub index_name: String,
    pub type_name: String,
    pub mapping: Option<Value>,
}

impl SearchConfig {
    pub fn new(index_name: impl Into<String>, type_name: impl Into<String>) -> Self {
        SearchConfig {
            index_name: index_name.into(),
            type_name: type_name.into(),
            mapping: None,
        }
    }

    pub fn with_mapping(mut self, mapping: Value) -> Self {
        self.mapping = Some(mapping);
        self
    }
}

/// Everything a provider needs about one committed revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionSnapshot {
    pub document_id: String,
    pub document_type: String,
    pub revision_id: String,
    pub state: String,
    pub content: Value,
    pub author: Author,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Filters for `SearchProvider::list`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub index: Option<String>,
    pub doc_type: Option<String>,
    pub state: Option<String>,
    pub limit: Option<usize>,
}

/// An exact-field-match query for `SearchProvider::search`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub index: Option<String>,
    pub state: Option<String>,
    pub field: String,
    pub value: Value,
}

impl SearchQuery {
    pub fn field_eq(field: impl Into<String>, value: Value) -> Self {
        SearchQuery {
            index: None,
            state: None,
            field: field.into(),
            value,
        }
    }
}

/// The pluggable indexing/search sink.
pub trait SearchProvider: Send + Sync + std::fmt::Debug {
    /// Create the index/type if it does not exist. Idempotent.
    fn ensure_index(&self, config: &SearchConfig) -> SearchResult<()>;

    /// Record a committed revision. Called once after every successful
    /// save or promotion, in commit order per document.
    fn index(
        &self,
        config: &SearchConfig,
        snapshot: &RevisionSnapshot,
        event: &IndexEvent,
    ) -> SearchResult<()>;

    /// Enumerate indexed revisions.
    fn list(&self, opts: &ListOptions) -> SearchResult<Vec<RevisionSnapshot>>;

    /// Query indexed revisions.
    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<RevisionSnapshot>>;
}
