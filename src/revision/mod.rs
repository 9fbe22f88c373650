//! Revisions: nodes of the per-document DAG
//!
//! A `Revision` wraps one commit object. Its first parent is `previous`
//! (the tip of the same state branch before this write), its optional
//! second parent is `origin` (the revision a promotion copied content
//! from). Identity is the commit id; everything else is metadata.
//!
//! Revisions are lazy: one can be constructed from a bare id without
//! touching the store. Reading the id back is free; the first access to
//! metadata or content performs exactly one commit load, cached for the
//! lifetime of the value.

mod collection;
mod history;

pub use collection::RevisionCollection;
pub use history::History;

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};

use crate::content::Content;
use crate::object_store::{state_ref, Author, Commit, ObjectId, ObjectStore, StoreError, StoreResult};

/// Name of the single blob each revision's tree carries.
pub const CONTENT_BLOB: &str = "content";

/// How a revision came to be, derived from its parent count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevisionKind {
    /// No parents: the root revision.
    Orphan,
    /// One parent: a plain save on some state branch.
    Save,
    /// Two parents: a promotion from another state branch.
    Promotion,
}

/// One immutable revision of a document.
#[derive(Debug, Clone)]
pub struct Revision {
    store: Arc<ObjectStore>,
    root_id: Option<ObjectId>,
    id: ObjectId,
    state: Option<String>,
    commit: OnceLock<Commit>,
    content: OnceLock<Content>,
}

impl Revision {
    /// A lazy revision bound to an id. Performs no I/O.
    pub(crate) fn lazy(
        store: Arc<ObjectStore>,
        root_id: Option<ObjectId>,
        id: ObjectId,
        state: Option<String>,
    ) -> Self {
        Revision {
            store,
            root_id,
            id,
            state,
            commit: OnceLock::new(),
            content: OnceLock::new(),
        }
    }

    /// A revision whose commit is already in hand (just written or walked
    /// to); metadata access will never hit the store.
    pub(crate) fn from_commit(
        store: Arc<ObjectStore>,
        root_id: Option<ObjectId>,
        id: ObjectId,
        commit: Commit,
        state: Option<String>,
    ) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(commit);
        Revision {
            store,
            root_id,
            id,
            state,
            commit: cell,
            content: OnceLock::new(),
        }
    }

    /// The content-addressed identifier. Never touches the store.
    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    /// The state branch this revision was reached through, if any.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Whether this is the document's designated root revision.
    pub fn is_root(&self) -> bool {
        self.root_id.as_ref() == Some(&self.id)
    }

    fn commit(&self) -> StoreResult<&Commit> {
        if let Some(commit) = self.commit.get() {
            return Ok(commit);
        }
        let loaded = self.store.read_commit(&self.id)?;
        Ok(self.commit.get_or_init(|| loaded))
    }

    pub fn author(&self) -> StoreResult<&Author> {
        Ok(&self.commit()?.author)
    }

    pub fn message(&self) -> StoreResult<&str> {
        Ok(&self.commit()?.message)
    }

    pub fn timestamp(&self) -> StoreResult<DateTime<Utc>> {
        Ok(self.commit()?.timestamp)
    }

    /// The content snapshot this revision carries.
    pub fn content(&self) -> StoreResult<&Content> {
        if let Some(content) = self.content.get() {
            return Ok(content);
        }
        let commit = self.commit()?;
        let tree = self.store.read_tree(&commit.tree)?;
        let blob_id = tree.blob(CONTENT_BLOB).ok_or_else(|| StoreError::Corruption {
            id: commit.tree.to_string(),
            reason: format!("tree has no '{}' entry", CONTENT_BLOB),
        })?;
        let bytes = self.store.read_blob(blob_id)?;
        let value = serde_json::from_slice(&bytes).map_err(|e| StoreError::Corruption {
            id: blob_id.to_string(),
            reason: format!("content blob is not valid JSON: {}", e),
        })?;
        Ok(self.content.get_or_init(|| Content::from_value(value)))
    }

    /// The parent on the same branch, or None for the root revision.
    /// Propagates this revision's state hint.
    pub fn previous(&self) -> StoreResult<Option<Revision>> {
        let commit = self.commit()?;
        Ok(commit.parents.first().map(|id| {
            Revision::lazy(
                self.store.clone(),
                self.root_id.clone(),
                id.clone(),
                self.state.clone(),
            )
        }))
    }

    /// The source revision a promotion copied content from, or None for
    /// saves and the root.
    pub fn origin(&self) -> StoreResult<Option<Revision>> {
        let commit = self.commit()?;
        Ok(commit.parents.get(1).map(|id| {
            Revision::lazy(self.store.clone(), self.root_id.clone(), id.clone(), None)
        }))
    }

    /// Derived from the parent count: orphan, save, or promotion.
    pub fn kind(&self) -> StoreResult<RevisionKind> {
        Ok(match self.commit()?.parents.len() {
            0 => RevisionKind::Orphan,
            1 => RevisionKind::Save,
            _ => RevisionKind::Promotion,
        })
    }

    /// Walks `previous` links from this revision down to the root.
    pub fn history(&self) -> History {
        History::starting_at(self.clone())
    }

    /// Whether this revision's content ever reached `state` through a
    /// promotion.
    ///
    /// True iff some promotion on the `state` branch has an origin that
    /// this revision is an ancestor of (or equal to). A save stacked on
    /// top of a promoted revision has not itself been promoted.
    pub fn has_been_promoted_to(&self, state: &str) -> StoreResult<bool> {
        let Some(tip_id) = self.store.resolve_ref(&state_ref(state))? else {
            return Ok(false);
        };

        let tip = Revision::lazy(self.store.clone(), self.root_id.clone(), tip_id, None);
        for step in tip.history() {
            let revision = step?;
            let commit = revision.commit()?;
            if let Some(origin_id) = commit.parents.get(1) {
                if self.is_ancestor_of(origin_id)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Whether this revision equals `descendant` or appears in its
    /// `previous` chain.
    fn is_ancestor_of(&self, descendant: &ObjectId) -> StoreResult<bool> {
        let mut cursor = Some(descendant.clone());
        while let Some(id) = cursor {
            if id == self.id {
                return Ok(true);
            }
            cursor = self.store.read_commit(&id)?.parents.first().cloned();
        }
        Ok(false)
    }

    /// Writes a commit for the given tree and advances `ref_name` with CAS
    /// against `expect_previous` (the ref value the caller observed; None
    /// when the ref did not exist yet).
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn write(
        store: &Arc<ObjectStore>,
        ref_name: &str,
        tree: ObjectId,
        author: Author,
        message: String,
        timestamp: DateTime<Utc>,
        previous: Option<ObjectId>,
        origin: Option<ObjectId>,
        expect_previous: Option<&ObjectId>,
        root_id: Option<ObjectId>,
        state: Option<String>,
    ) -> StoreResult<Revision> {
        let mut parents = Vec::new();
        if let Some(previous) = previous {
            parents.push(previous);
        }
        if let Some(origin) = origin {
            parents.push(origin);
        }

        let commit = Commit {
            tree,
            parents,
            author,
            timestamp,
            message,
        };
        let id = store.write_commit(&commit)?;
        store.update_ref(ref_name, &id, expect_previous)?;
        Ok(Revision::from_commit(store.clone(), root_id, id, commit, state))
    }
}

impl PartialEq for Revision {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Revision {}
