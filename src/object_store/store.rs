//! The per-document object store
//!
//! A bare, git-shaped layout:
//!
//! ```text
//! objects/<2 hex>/<62 hex>   loose objects, immutable once written
//! refs/heads/<state>         branch tips, one hex id per file
//! refs/tags/root             the designated root revision
//! ```
//!
//! Objects are verified on every read: the stored bytes must decode and
//! re-hash to the id they were looked up under. Ref updates are
//! compare-and-swap through a `<ref>.lock` file, so two concurrent writers
//! on the same branch produce one success and one stale/locked failure.

use std::sync::Arc;

use super::backend::StoreBackend;
use super::errors::{StoreError, StoreResult};
use super::object::{decode_object, encode_object, Commit, Object, ObjectId, ObjectKind, Tree, TreeEntry};

const OBJECTS_DIR: &str = "objects";
const HEADS_DIR: &str = "refs/heads";
const TAGS_DIR: &str = "refs/tags";

/// Content-addressed object store for a single document.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    backend: Arc<dyn StoreBackend>,
}

impl ObjectStore {
    /// Initializes the store layout, idempotently, and opens it.
    pub fn init(backend: Arc<dyn StoreBackend>) -> StoreResult<Self> {
        backend.create_dir_all(OBJECTS_DIR)?;
        backend.create_dir_all(HEADS_DIR)?;
        backend.create_dir_all(TAGS_DIR)?;
        Ok(ObjectStore { backend })
    }

    /// Opens an existing store; `StoreError::NotFound` if none was
    /// initialized behind this backend.
    pub fn open(backend: Arc<dyn StoreBackend>) -> StoreResult<Self> {
        if !backend.exists(OBJECTS_DIR)? {
            return Err(StoreError::NotFound(OBJECTS_DIR.to_string()));
        }
        Ok(ObjectStore { backend })
    }

    /// Whether a store has been initialized behind this backend.
    pub fn exists(backend: &Arc<dyn StoreBackend>) -> StoreResult<bool> {
        backend.exists(OBJECTS_DIR)
    }

    fn object_path(id: &ObjectId) -> String {
        let hex = id.as_str();
        format!("{}/{}/{}", OBJECTS_DIR, &hex[..2], &hex[2..])
    }

    fn write_object(&self, kind: ObjectKind, body: &[u8]) -> StoreResult<ObjectId> {
        let id = ObjectId::compute(kind, body);
        let path = Self::object_path(&id);
        // Objects are immutable: an existing file already holds these bytes.
        if !self.backend.exists(&path)? {
            self.backend.write(&path, &encode_object(kind, body))?;
        }
        Ok(id)
    }

    fn read_object(&self, id: &ObjectId) -> StoreResult<(ObjectKind, Vec<u8>)> {
        let bytes = self.backend.read(&Self::object_path(id))?;
        let (kind, body) = decode_object(&bytes).map_err(|e| StoreError::Corruption {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        if &ObjectId::compute(kind, body) != id {
            return Err(StoreError::Corruption {
                id: id.to_string(),
                reason: "stored bytes do not hash to the object id".to_string(),
            });
        }
        Ok((kind, body.to_vec()))
    }

    /// Stores raw bytes as a blob.
    pub fn write_blob(&self, bytes: &[u8]) -> StoreResult<ObjectId> {
        self.write_object(ObjectKind::Blob, bytes)
    }

    /// Stores a tree of named blob references.
    pub fn write_tree(&self, entries: Vec<TreeEntry>) -> StoreResult<ObjectId> {
        let tree = Tree::new(entries);
        self.write_object(ObjectKind::Tree, &tree.encode()?)
    }

    /// Stores a commit.
    pub fn write_commit(&self, commit: &Commit) -> StoreResult<ObjectId> {
        self.write_object(ObjectKind::Commit, &commit.encode()?)
    }

    /// Looks up an object of any kind.
    pub fn lookup(&self, id: &ObjectId) -> StoreResult<Object> {
        let (kind, body) = self.read_object(id)?;
        let corrupt = |e: StoreError| StoreError::Corruption {
            id: id.to_string(),
            reason: e.to_string(),
        };
        Ok(match kind {
            ObjectKind::Blob => Object::Blob(body),
            ObjectKind::Tree => Object::Tree(Tree::decode(&body).map_err(corrupt)?),
            ObjectKind::Commit => Object::Commit(Commit::decode(&body).map_err(corrupt)?),
        })
    }

    /// Looks up a blob's bytes.
    pub fn read_blob(&self, id: &ObjectId) -> StoreResult<Vec<u8>> {
        match self.lookup(id)? {
            Object::Blob(bytes) => Ok(bytes),
            other => Err(self.kind_mismatch(id, "blob", &other)),
        }
    }

    /// Looks up a tree.
    pub fn read_tree(&self, id: &ObjectId) -> StoreResult<Tree> {
        match self.lookup(id)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(self.kind_mismatch(id, "tree", &other)),
        }
    }

    /// Looks up a commit.
    pub fn read_commit(&self, id: &ObjectId) -> StoreResult<Commit> {
        match self.lookup(id)? {
            Object::Commit(commit) => Ok(commit),
            other => Err(self.kind_mismatch(id, "commit", &other)),
        }
    }

    fn kind_mismatch(&self, id: &ObjectId, wanted: &str, got: &Object) -> StoreError {
        let got = match got {
            Object::Blob(_) => "blob",
            Object::Tree(_) => "tree",
            Object::Commit(_) => "commit",
        };
        StoreError::Corruption {
            id: id.to_string(),
            reason: format!("expected a {}, found a {}", wanted, got),
        }
    }

    /// Whether an object with this id is present.
    pub fn has_object(&self, id: &ObjectId) -> StoreResult<bool> {
        self.backend.exists(&Self::object_path(id))
    }

    /// Resolves a ref to the id it points at, or None if it does not exist.
    pub fn resolve_ref(&self, name: &str) -> StoreResult<Option<ObjectId>> {
        match self.backend.read(name) {
            Ok(bytes) => {
                let text = String::from_utf8(bytes).map_err(|_| StoreError::Corruption {
                    id: name.to_string(),
                    reason: "ref is not UTF-8".to_string(),
                })?;
                let id = ObjectId::from_hex(text.trim()).map_err(|e| StoreError::Corruption {
                    id: name.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(Some(id))
            }
            Err(StoreError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Advances a ref with compare-and-swap.
    ///
    /// `expect_previous` must match the ref's current value exactly (None
    /// for "the ref must not exist yet"). On mismatch the update fails with
    /// `RefStale` and the ref is left untouched; if another writer holds
    /// the lock the update fails with `RefLocked`.
    pub fn update_ref(
        &self,
        name: &str,
        new: &ObjectId,
        expect_previous: Option<&ObjectId>,
    ) -> StoreResult<()> {
        let lock_path = format!("{}.lock", name);
        if !self.backend.write_new(&lock_path, new.as_str().as_bytes())? {
            return Err(StoreError::RefLocked(name.to_string()));
        }

        let result = (|| {
            let current = self.resolve_ref(name)?;
            if current.as_ref() != expect_previous {
                return Err(StoreError::RefStale {
                    name: name.to_string(),
                    expected: expect_previous.cloned(),
                    found: current,
                });
            }
            self.backend.write(name, format!("{}\n", new).as_bytes())
        })();

        let unlock = self.backend.remove(&lock_path);
        result?;
        unlock
    }
}

/// Full ref name for a state branch.
pub fn state_ref(state: &str) -> String {
    format!("{}/{}", HEADS_DIR, state)
}

/// The dedicated ref pointing at the root revision.
pub const ROOT_REF: &str = "refs/tags/root";
