//! Documents: the aggregate over content, revisions, and states
//!
//! A document owns one object store, identified by its id under the
//! storage root, and an in-memory content buffer holding unsaved edits.
//! `save_in` advances a state branch with the buffer's content; `promote`
//! copies the tip of one state onto another, recording provenance as a
//! two-parent revision. Every successful write registers the document in
//! the process-wide index and notifies the search provider; the search
//! call is last and its failure never undoes the commit.

mod errors;
mod index;

pub use errors::{DocumentError, DocumentResult};
pub use index::{DocumentIndex, IndexEntry};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::Config;
use crate::content::Content;
use crate::object_store::{
    state_ref, Author, Commit, ObjectId, ObjectStore, StoreError, TreeEntry, ROOT_REF,
};
use crate::observability::{log_event, Event};
use crate::revision::{History, Revision, RevisionCollection, CONTENT_BLOB};
use crate::search::{IndexEvent, NullSearch, RevisionSnapshot, SearchConfig, SearchProvider};

/// The draft state every document starts on.
pub const MASTER: &str = "master";

/// Default document type, used as the search type tag.
pub const DEFAULT_TYPE: &str = "document";

const ROOT_AUTHOR_NAME: &str = "The Colonel";
const ROOT_AUTHOR_EMAIL: &str = "colonel@example.com";
const ROOT_MESSAGE: &str = "First Commit";

/// A versioned structured-content document.
pub struct Document {
    id: String,
    doc_type: String,
    config: Config,
    content: Content,
    store: Option<Arc<ObjectStore>>,
    registry: DocumentIndex,
    search: Arc<dyn SearchProvider>,
    search_config: SearchConfig,
    search_ready: bool,
}

impl Document {
    /// A fresh document with a random 128-bit hex id and the default type.
    /// Nothing touches disk until the first save.
    pub fn new(config: &Config) -> Self {
        Self::with_type(config, DEFAULT_TYPE)
    }

    /// A fresh document with the given type tag.
    pub fn with_type(config: &Config, doc_type: &str) -> Self {
        let id = Uuid::new_v4().simple().to_string();
        Self::assemble(config, id, doc_type.to_string())
    }

    fn assemble(config: &Config, id: String, doc_type: String) -> Self {
        let search_config = SearchConfig::new(config.index_name.clone(), doc_type.clone());
        Document {
            id,
            doc_type,
            config: config.clone(),
            content: Content::new(),
            store: None,
            registry: DocumentIndex::open(&config.storage_path),
            search: Arc::new(NullSearch),
            search_config,
            search_ready: false,
        }
    }

    /// Opens an existing document by id, loading the master tip's content
    /// into the buffer. Returns None if no store exists for the id.
    pub fn open(config: &Config, id: &str) -> DocumentResult<Option<Document>> {
        let backend = config.store_backend(id);
        if !ObjectStore::exists(&backend)? {
            return Ok(None);
        }
        let store = Arc::new(ObjectStore::open(backend)?);

        let doc_type = DocumentIndex::open(&config.storage_path)
            .documents()?
            .into_iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.doc_type)
            .unwrap_or_else(|| DEFAULT_TYPE.to_string());

        let mut document = Self::assemble(config, id.to_string(), doc_type);
        document.store = Some(store);
        if let Some(tip) = document.revisions()?.by_state(MASTER)? {
            document.content = tip.content()?.clone();
        }
        Ok(Some(document))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    /// The unsaved content buffer.
    pub fn content(&self) -> &Content {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut Content {
        &mut self.content
    }

    pub fn set_content(&mut self, content: Content) {
        self.content = content;
    }

    /// Wires a search provider and its per-type configuration. The
    /// provider is notified after every subsequent successful write.
    pub fn with_search(
        mut self,
        provider: Arc<dyn SearchProvider>,
        search_config: SearchConfig,
    ) -> Self {
        self.search = provider;
        self.search_config = search_config;
        self.search_ready = false;
        self
    }

    /// Saves the content buffer to `master`.
    pub fn save(
        &mut self,
        author: &Author,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<Revision> {
        self.save_in(MASTER, author, message, timestamp)
    }

    /// Saves the content buffer as a new revision on `state`.
    ///
    /// Initializes the object store and the root revision on first write.
    /// The new revision's `previous` is the state's current tip, or the
    /// root revision for a state that does not exist yet. Fails with
    /// `ConcurrentWrite` if the tip moves underneath the write.
    pub fn save_in(
        &mut self,
        state: &str,
        author: &Author,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<Revision> {
        let store = self.ensure_store()?;
        let root_id = self.ensure_root(&store, timestamp)?;

        let tip = store.resolve_ref(&state_ref(state))?;
        let expect = tip.clone();
        let previous = tip.unwrap_or_else(|| root_id.clone());

        let json = self.content.to_json()?;
        let blob = store.write_blob(json.as_bytes())?;
        let tree = store.write_tree(vec![TreeEntry { name: CONTENT_BLOB.into(), blob }])?;

        let revision = Revision::write(
            &store,
            &state_ref(state),
            tree,
            author.clone(),
            message.to_string(),
            timestamp,
            Some(previous),
            None,
            expect.as_ref(),
            Some(root_id),
            Some(state.to_string()),
        )
        .map_err(|e| self.map_write_error(state, e))?;

        log_event(
            Event::RevisionSaved,
            &[
                ("document_id", self.id.as_str()),
                ("state", state),
                ("revision_id", revision.id().as_str()),
            ],
        );

        self.registry.register(&self.id, &self.doc_type)?;
        log_event(Event::IndexRegistered, &[("document_id", self.id.as_str())]);

        self.notify_search(&revision, state, IndexEvent::save(state))?;
        Ok(revision)
    }

    /// Promotes the tip of `from` onto `to`.
    ///
    /// The new revision's content is the origin's content, by reference:
    /// the promoted commit reuses the origin's tree, so promotion never
    /// transforms content. The result is a two-parent revision whose id
    /// differs from the origin's.
    pub fn promote(
        &mut self,
        from: &str,
        to: &str,
        author: &Author,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<Revision> {
        let store = match self.open_store() {
            Ok(store) => store,
            // A document with no store has no source tip to promote.
            Err(DocumentError::NotFound(_)) => {
                return Err(DocumentError::MissingSource(from.to_string()))
            }
            Err(e) => return Err(e),
        };
        let root_id = store
            .resolve_ref(ROOT_REF)?
            .ok_or_else(|| DocumentError::MissingSource(from.to_string()))?;

        let origin_id = store
            .resolve_ref(&state_ref(from))?
            .ok_or_else(|| DocumentError::MissingSource(from.to_string()))?;
        let origin_commit = store.read_commit(&origin_id)?;

        let tip = store.resolve_ref(&state_ref(to))?;
        let expect = tip.clone();
        let previous = tip.unwrap_or_else(|| root_id.clone());

        let revision = Revision::write(
            &store,
            &state_ref(to),
            origin_commit.tree,
            author.clone(),
            message.to_string(),
            timestamp,
            Some(previous),
            Some(origin_id),
            expect.as_ref(),
            Some(root_id),
            Some(to.to_string()),
        )
        .map_err(|e| self.map_write_error(to, e))?;

        log_event(
            Event::RevisionPromoted,
            &[
                ("document_id", self.id.as_str()),
                ("from", from),
                ("to", to),
                ("revision_id", revision.id().as_str()),
            ],
        );

        self.notify_search(&revision, to, IndexEvent::promotion(to))?;
        Ok(revision)
    }

    /// Accessor over this document's revisions.
    pub fn revisions(&self) -> DocumentResult<RevisionCollection> {
        let store = self.open_store()?;
        let root_id = store.resolve_ref(ROOT_REF)?;
        Ok(RevisionCollection::new(store, root_id))
    }

    /// Walks revisions tip-to-root starting from a state's tip, or from a
    /// bare revision id. An unknown state or id yields an empty walk.
    pub fn history(&self, state_or_id: &str) -> DocumentResult<History> {
        let revisions = self.revisions()?;
        if let Some(tip) = revisions.by_state(state_or_id)? {
            return Ok(tip.history());
        }
        if let Ok(revision) = revisions.by_id(state_or_id) {
            if self.open_store()?.has_object(revision.id())? {
                return Ok(revision.history());
            }
        }
        Ok(History::empty())
    }

    fn ensure_store(&mut self) -> DocumentResult<Arc<ObjectStore>> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let backend = self.config.store_backend(&self.id);
        let created = !ObjectStore::exists(&backend)?;
        let store = Arc::new(ObjectStore::init(backend)?);
        if created {
            log_event(Event::StoreInit, &[("document_id", self.id.as_str())]);
        }
        self.store = Some(store.clone());
        Ok(store)
    }

    fn open_store(&self) -> DocumentResult<Arc<ObjectStore>> {
        if let Some(store) = &self.store {
            return Ok(store.clone());
        }
        let backend = self.config.store_backend(&self.id);
        match ObjectStore::open(backend) {
            Ok(store) => Ok(Arc::new(store)),
            Err(StoreError::NotFound(_)) => Err(DocumentError::NotFound(self.id.clone())),
            Err(e) => Err(e.into()),
        }
    }

    /// Creates the root revision if the document has never been written,
    /// adopting a concurrently created root when the race is lost.
    fn ensure_root(
        &self,
        store: &Arc<ObjectStore>,
        timestamp: DateTime<Utc>,
    ) -> DocumentResult<ObjectId> {
        if let Some(id) = store.resolve_ref(ROOT_REF)? {
            return Ok(id);
        }

        let json = Content::new().to_json()?;
        let blob = store.write_blob(json.as_bytes())?;
        let tree = store.write_tree(vec![TreeEntry { name: CONTENT_BLOB.into(), blob }])?;
        let commit = Commit {
            tree,
            parents: Vec::new(),
            author: Author::new(ROOT_AUTHOR_NAME, ROOT_AUTHOR_EMAIL),
            timestamp,
            message: ROOT_MESSAGE.to_string(),
        };
        let id = store.write_commit(&commit)?;

        match store.update_ref(ROOT_REF, &id, None) {
            Ok(()) => {
                log_event(
                    Event::RootCreated,
                    &[("document_id", self.id.as_str()), ("revision_id", id.as_str())],
                );
                Ok(id)
            }
            Err(StoreError::RefStale { .. }) | Err(StoreError::RefLocked(_)) => store
                .resolve_ref(ROOT_REF)?
                .ok_or_else(|| DocumentError::ConcurrentWrite("root".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn map_write_error(&self, state: &str, error: StoreError) -> DocumentError {
        match error {
            StoreError::RefStale { .. } | StoreError::RefLocked(_) => {
                log_event(
                    Event::WriteConflict,
                    &[("document_id", self.id.as_str()), ("state", state)],
                );
                DocumentError::ConcurrentWrite(state.to_string())
            }
            e => e.into(),
        }
    }

    /// Pushes a committed revision to the search provider. Always the
    /// last step of a write; failure is reported but the commit stands.
    fn notify_search(
        &mut self,
        revision: &Revision,
        state: &str,
        event: IndexEvent,
    ) -> DocumentResult<()> {
        let soft_fail = |id: &ObjectId, e| {
            log_event(
                Event::SearchIndexFailed,
                &[("document_id", self.id.as_str()), ("revision_id", id.as_str())],
            );
            DocumentError::IndexingFailed {
                revision_id: id.to_string(),
                source: e,
            }
        };

        if !self.search_ready {
            self.search
                .ensure_index(&self.search_config)
                .map_err(|e| soft_fail(revision.id(), e))?;
            self.search_ready = true;
        }

        let snapshot = RevisionSnapshot {
            document_id: self.id.clone(),
            document_type: self.doc_type.clone(),
            revision_id: revision.id().to_string(),
            state: state.to_string(),
            content: revision.content()?.as_value().clone(),
            author: revision.author()?.clone(),
            message: revision.message()?.to_string(),
            timestamp: revision.timestamp()?,
        };

        self.search
            .index(&self.search_config, &snapshot, &event)
            .map_err(|e| soft_fail(revision.id(), e))?;

        log_event(
            Event::SearchIndexed,
            &[
                ("document_id", self.id.as_str()),
                ("state", state),
                ("event", event.name.as_str()),
            ],
        );
        Ok(())
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("doc_type", &self.doc_type)
            .finish()
    }
}
