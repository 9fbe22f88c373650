//! Git-shaped content-addressed object store
//!
//! One store per document, holding immutable blob/tree/commit objects and
//! mutable refs (state branch tips plus the root tag). The store knows
//! nothing about revisions or documents; it only writes objects, verifies
//! them on read, and advances refs under compare-and-swap.

mod backend;
mod errors;
mod object;
mod store;

pub use backend::{FsBackend, MemoryBackend, StoreBackend};
pub use errors::{StoreError, StoreResult};
pub use object::{Author, Commit, Object, ObjectId, ObjectKind, Tree, TreeEntry};
pub use store::{state_ref, ObjectStore, ROOT_REF};
