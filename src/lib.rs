//! vellum - a versioned structured-content store with a publishing pipeline
//!
//! Every document holds a tree-shaped content value. Each mutation is an
//! immutable revision in a per-document, content-addressed DAG; named
//! state branches (`master` for draft, `published` for live, any string
//! works) point at tips, and content flows between states through
//! explicit promotions that preserve provenance.

pub mod config;
pub mod content;
pub mod document;
pub mod object_store;
pub mod observability;
pub mod revision;
pub mod search;

pub use config::{BackendFactory, Config};
pub use content::{Content, ContentError};
pub use document::{Document, DocumentError, DocumentIndex, DocumentResult, IndexEntry, MASTER};
pub use object_store::{Author, ObjectId, ObjectStore, StoreError};
pub use revision::{History, Revision, RevisionCollection, RevisionKind};
pub use search::{
    EventKind, IndexEvent, ListOptions, MemorySearch, NullSearch, RevisionSnapshot, SearchConfig,
    SearchError, SearchProvider, SearchQuery, SearchResult,
};
