//! In-memory search provider
//!
//! Keeps the latest revision per (index, type, document, state), the same
//! projection a real back-end would hold. Used by tests and by embedders
//! that want list/search without an external service.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use super::{
    IndexEvent, ListOptions, RevisionSnapshot, SearchConfig, SearchError, SearchProvider,
    SearchQuery, SearchResult,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntryKey {
    index: String,
    type_name: String,
    document_id: String,
    state: String,
}

#[derive(Debug, Clone)]
struct Entry {
    snapshot: RevisionSnapshot,
    last_event: IndexEvent,
}

/// RwLock-backed in-memory projection of indexed revisions.
#[derive(Debug, Default)]
pub struct MemorySearch {
    indexes: RwLock<HashSet<String>>,
    entries: RwLock<HashMap<EntryKey, Entry>>,
}

impl MemorySearch {
    pub fn new() -> Self {
        MemorySearch::default()
    }

    /// The event that produced the current entry for a document/state,
    /// if one exists.
    pub fn last_event(&self, document_id: &str, state: &str) -> Option<IndexEvent> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .iter()
            .find(|(key, _)| key.document_id == document_id && key.state == state)
            .map(|(_, entry)| entry.last_event.clone())
    }

    fn collect<F>(&self, limit: Option<usize>, mut keep: F) -> Vec<RevisionSnapshot>
    where
        F: FnMut(&EntryKey, &Entry) -> bool,
    {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let mut hits: Vec<&Entry> = entries
            .iter()
            .filter(|(key, entry)| keep(key, entry))
            .map(|(_, entry)| entry)
            .collect();
        // Deterministic output: order by document, then state.
        hits.sort_by(|a, b| {
            (&a.snapshot.document_id, &a.snapshot.state)
                .cmp(&(&b.snapshot.document_id, &b.snapshot.state))
        });
        if let Some(limit) = limit {
            hits.truncate(limit);
        }
        hits.into_iter().map(|entry| entry.snapshot.clone()).collect()
    }
}

impl SearchProvider for MemorySearch {
    fn ensure_index(&self, config: &SearchConfig) -> SearchResult<()> {
        let mut indexes = self.indexes.write().unwrap_or_else(|e| e.into_inner());
        indexes.insert(config.index_name.clone());
        Ok(())
    }

    fn index(
        &self,
        config: &SearchConfig,
        snapshot: &RevisionSnapshot,
        event: &IndexEvent,
    ) -> SearchResult<()> {
        {
            let indexes = self.indexes.read().unwrap_or_else(|e| e.into_inner());
            if !indexes.contains(&config.index_name) {
                return Err(SearchError::MissingIndex(config.index_name.clone()));
            }
        }
        let key = EntryKey {
            index: config.index_name.clone(),
            type_name: config.type_name.clone(),
            document_id: snapshot.document_id.clone(),
            state: snapshot.state.clone(),
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key,
            Entry {
                snapshot: snapshot.clone(),
                last_event: event.clone(),
            },
        );
        Ok(())
    }

    fn list(&self, opts: &ListOptions) -> SearchResult<Vec<RevisionSnapshot>> {
        Ok(self.collect(opts.limit, |key, entry| {
            opts.index.as_ref().map_or(true, |i| &key.index == i)
                && opts.doc_type.as_ref().map_or(true, |t| &key.type_name == t)
                && opts.state.as_ref().map_or(true, |s| &entry.snapshot.state == s)
        }))
    }

    fn search(&self, query: &SearchQuery) -> SearchResult<Vec<RevisionSnapshot>> {
        Ok(self.collect(None, |key, entry| {
            query.index.as_ref().map_or(true, |i| &key.index == i)
                && query.state.as_ref().map_or(true, |s| &entry.snapshot.state == s)
                && entry.snapshot.content.get(&query.field) == Some(&query.value)
        }))
    }
}
