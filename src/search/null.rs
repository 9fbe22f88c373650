//! No-op search provider

use super::{
    IndexEvent, ListOptions, RevisionSnapshot, SearchConfig, SearchProvider, SearchQuery,
    SearchResult,
};

/// A provider that accepts every call and indexes nothing.
///
/// Documents are wired to this by default, so the write path's
/// notification points are unconditional.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSearch;

impl SearchProvider for NullSearch {
    fn ensure_index(&self, _config: &SearchConfig) -> SearchResult<()> {
        Ok(())
    }

    fn index(
        &self,
        _config: &SearchConfig,
        _snapshot: &RevisionSnapshot,
        _event: &IndexEvent,
    ) -> SearchResult<()> {
        Ok(())
    }

    fn list(&self, _opts: &ListOptions) -> SearchResult<Vec<RevisionSnapshot>> {
        Ok(Vec::new())
    }

    fn search(&self, _query: &SearchQuery) -> SearchResult<Vec<RevisionSnapshot>> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_search_accepts_everything() {
        let provider = NullSearch;
        provider
            .ensure_index(&SearchConfig::new("idx", "document"))
            .unwrap();
        assert!(provider.list(&ListOptions::default()).unwrap().is_empty());
    }
}
