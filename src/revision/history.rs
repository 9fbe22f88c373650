//! History traversal
//!
//! A lazy, finite, non-restartable walk over `previous` links, tip to
//! root. Each step that forces a commit load may fail; errors are yielded
//! in place and terminate the walk.

use crate::object_store::{StoreError, StoreResult};

use super::Revision;

/// Iterator over a revision's ancestry, starting at the revision itself.
///
/// The state hint of the starting revision propagates to every yielded
/// revision.
#[derive(Debug)]
pub struct History {
    cursor: Option<Revision>,
    pending_err: Option<StoreError>,
}

impl History {
    pub(crate) fn starting_at(revision: Revision) -> Self {
        History {
            cursor: Some(revision),
            pending_err: None,
        }
    }

    /// An already-exhausted walk (no tip to start from).
    pub(crate) fn empty() -> Self {
        History {
            cursor: None,
            pending_err: None,
        }
    }
}

impl Iterator for History {
    type Item = StoreResult<Revision>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending_err.take() {
            return Some(Err(err));
        }
        let current = self.cursor.take()?;
        match current.previous() {
            Ok(previous) => self.cursor = previous,
            Err(err) => self.pending_err = Some(err),
        }
        Some(Ok(current))
    }
}
