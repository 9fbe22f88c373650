//! Revision lookup for one document
//!
//! Indexes a document's revisions by commit id or by state name, and
//! knows the designated root revision.

use std::sync::Arc;

use crate::object_store::{state_ref, ObjectId, ObjectStore, StoreResult};

use super::Revision;

/// Accessor over a single document's revisions.
#[derive(Debug, Clone)]
pub struct RevisionCollection {
    store: Arc<ObjectStore>,
    root_id: Option<ObjectId>,
}

impl RevisionCollection {
    pub(crate) fn new(store: Arc<ObjectStore>, root_id: Option<ObjectId>) -> Self {
        RevisionCollection { store, root_id }
    }

    /// A lazy revision bound to a hex commit id. Validates the id shape
    /// but performs no store I/O.
    pub fn by_id(&self, id: &str) -> StoreResult<Revision> {
        let id = ObjectId::from_hex(id)?;
        Ok(Revision::lazy(self.store.clone(), self.root_id.clone(), id, None))
    }

    /// The revision at a state branch's current tip, or None if the ref
    /// does not exist. The returned revision carries the state as its
    /// traversal hint.
    pub fn by_state(&self, state: &str) -> StoreResult<Option<Revision>> {
        let Some(tip) = self.store.resolve_ref(&state_ref(state))? else {
            return Ok(None);
        };
        Ok(Some(Revision::lazy(
            self.store.clone(),
            self.root_id.clone(),
            tip,
            Some(state.to_string()),
        )))
    }

    /// The designated root revision, or None if the document has never
    /// been written.
    pub fn root_revision(&self) -> Option<Revision> {
        self.root_id.as_ref().map(|id| {
            Revision::lazy(self.store.clone(), self.root_id.clone(), id.clone(), None)
        })
    }
}
