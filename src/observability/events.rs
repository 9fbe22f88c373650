//! Write-path events
//!
//! Every observable step of the write protocol has a named event. Events
//! are explicit and typed; free-form event strings do not appear in the
//! write path.

use std::fmt;

use super::Severity;

/// Observable events in the document write path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// A document's object store was initialized on first write.
    StoreInit,
    /// The root revision was created.
    RootCreated,
    /// A save advanced a state branch.
    RevisionSaved,
    /// A promotion advanced a state branch.
    RevisionPromoted,
    /// A branch ref moved to a new tip.
    RefAdvanced,
    /// A compare-and-swap on a branch ref lost.
    WriteConflict,
    /// The document was registered in the document index.
    IndexRegistered,
    /// A committed revision was pushed to the search provider.
    SearchIndexed,
    /// The search provider call failed; the commit stands.
    SearchIndexFailed,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreInit => "STORE_INIT",
            Event::RootCreated => "ROOT_CREATED",
            Event::RevisionSaved => "REVISION_SAVED",
            Event::RevisionPromoted => "REVISION_PROMOTED",
            Event::RefAdvanced => "REF_ADVANCED",
            Event::WriteConflict => "WRITE_CONFLICT",
            Event::IndexRegistered => "INDEX_REGISTERED",
            Event::SearchIndexed => "SEARCH_INDEXED",
            Event::SearchIndexFailed => "SEARCH_INDEX_FAILED",
        }
    }

    /// The severity this event is logged at.
    pub fn severity(&self) -> Severity {
        match self {
            Event::WriteConflict | Event::SearchIndexFailed => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
