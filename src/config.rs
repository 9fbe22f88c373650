//! Configuration surface
//!
//! Options recognized by the core: the storage root for per-document
//! stores and the document index, the default search index name, and an
//! optional alternate object-store backend.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::object_store::{FsBackend, StoreBackend};

/// Default search index name.
pub const DEFAULT_INDEX_NAME: &str = "vellum";

/// Produces a store backend for a given document id. Injected through
/// `Config::with_backend` to replace the filesystem default.
pub trait BackendFactory: Send + Sync + fmt::Debug {
    fn backend(&self, document_id: &str) -> Arc<dyn StoreBackend>;
}

/// Core configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root directory for per-document repositories and the index file.
    pub storage_path: PathBuf,
    /// Default search index name.
    pub index_name: String,
    /// Optional alternate backend handle for the store adapter.
    pub object_store_backend: Option<Arc<dyn BackendFactory>>,
}

impl Config {
    pub fn new(storage_path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: storage_path.into(),
            index_name: DEFAULT_INDEX_NAME.to_string(),
            object_store_backend: None,
        }
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_backend(mut self, factory: Arc<dyn BackendFactory>) -> Self {
        self.object_store_backend = Some(factory);
        self
    }

    /// The backend a document's object store sits on: the configured
    /// factory if any, otherwise a directory under the storage root.
    pub(crate) fn store_backend(&self, document_id: &str) -> Arc<dyn StoreBackend> {
        match &self.object_store_backend {
            Some(factory) => factory.backend(document_id),
            None => Arc::new(FsBackend::new(self.storage_path.join(document_id))),
        }
    }
}
