//! The document index
//!
//! A process-wide registry of which documents exist, persisted as a flat
//! file of newline-delimited JSON records under the storage root.
//! Registration is an idempotent upsert keyed by document id. Writers
//! serialize through an on-disk lock file plus an in-process mutex;
//! readers go lock-free, relying on the atomic rename of each rewrite to
//! only ever observe a consistent historical snapshot.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{DocumentError, DocumentResult};

const INDEX_FILE: &str = "index";
const LOCK_RETRIES: u32 = 50;
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(10);

/// One registry record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub doc_type: String,
}

/// Registry handle bound to one storage root.
#[derive(Debug)]
pub struct DocumentIndex {
    path: PathBuf,
    lock_path: PathBuf,
    write_lock: Mutex<()>,
}

impl DocumentIndex {
    /// Opens the registry for a storage root. The index file is created
    /// on first registration.
    pub fn open(storage_root: &Path) -> Self {
        let path = storage_root.join(INDEX_FILE);
        let lock_path = storage_root.join(format!("{}.lock", INDEX_FILE));
        DocumentIndex {
            path,
            lock_path,
            write_lock: Mutex::new(()),
        }
    }

    /// Registers a document. Re-registering the same `(id, type)` pair is
    /// a no-op; re-registering an id with a different type replaces the
    /// type.
    pub fn register(&self, id: &str, doc_type: &str) -> DocumentResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let _lock = FileLock::acquire(&self.lock_path)?;

        let mut entries = self.read_entries()?;
        match entries.iter_mut().find(|entry| entry.id == id) {
            Some(existing) if existing.doc_type == doc_type => return Ok(()),
            Some(existing) => existing.doc_type = doc_type.to_string(),
            None => entries.push(IndexEntry {
                id: id.to_string(),
                doc_type: doc_type.to_string(),
            }),
        }

        self.write_entries(&entries)
    }

    /// All registered documents, in registration order.
    pub fn documents(&self) -> DocumentResult<Vec<IndexEntry>> {
        self.read_entries()
    }

    fn read_entries(&self) -> DocumentResult<Vec<IndexEntry>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(DocumentError::Index(e.to_string())),
        };

        let mut entries = Vec::new();
        for line in text.lines() {
            if line.is_empty() {
                continue;
            }
            let entry = serde_json::from_str(line).map_err(|e| {
                DocumentError::Corruption(format!("bad index record '{}': {}", line, e))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    fn write_entries(&self, entries: &[IndexEntry]) -> DocumentResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| DocumentError::Index(e.to_string()))?;
        }

        let mut body = String::new();
        for entry in entries {
            let line = serde_json::to_string(entry)
                .map_err(|e| DocumentError::Index(e.to_string()))?;
            body.push_str(&line);
            body.push('\n');
        }

        // Rewrite through a temp file so readers never see a torn file.
        let tmp_path = self.path.with_extension("tmp");
        let write = (|| -> std::io::Result<()> {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(body.as_bytes())?;
            tmp.sync_all()?;
            fs::rename(&tmp_path, &self.path)
        })();
        write.map_err(|e| DocumentError::Index(e.to_string()))
    }
}

/// Advisory lock held for the duration of one registry rewrite.
struct FileLock {
    path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> DocumentResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| DocumentError::Index(e.to_string()))?;
        }
        for _ in 0..LOCK_RETRIES {
            match fs::OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(FileLock {
                        path: path.to_path_buf(),
                    })
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
                Err(e) => return Err(DocumentError::Index(e.to_string())),
            }
        }
        Err(DocumentError::Index(format!(
            "could not acquire lock '{}'",
            path.display()
        )))
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_registry_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let index = DocumentIndex::open(temp_dir.path());
        assert!(index.documents().unwrap().is_empty());
    }

    #[test]
    fn test_register_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let index = DocumentIndex::open(temp_dir.path());

        index.register("doc1", "document").unwrap();
        index.register("doc2", "article").unwrap();

        let entries = index.documents().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "doc1");
        assert_eq!(entries[1].doc_type, "article");
    }

    #[test]
    fn test_register_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let index = DocumentIndex::open(temp_dir.path());

        index.register("doc1", "document").unwrap();
        index.register("doc1", "document").unwrap();

        assert_eq!(index.documents().unwrap().len(), 1);
    }

    #[test]
    fn test_reregister_replaces_type() {
        let temp_dir = TempDir::new().unwrap();
        let index = DocumentIndex::open(temp_dir.path());

        index.register("doc1", "document").unwrap();
        index.register("doc1", "article").unwrap();

        let entries = index.documents().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].doc_type, "article");
    }

    #[test]
    fn test_registry_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        {
            let index = DocumentIndex::open(temp_dir.path());
            index.register("doc1", "document").unwrap();
        }
        let index = DocumentIndex::open(temp_dir.path());
        assert_eq!(index.documents().unwrap().len(), 1);
    }

    #[test]
    fn test_corrupt_record_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index"), "not json\n").unwrap();

        let index = DocumentIndex::open(temp_dir.path());
        let err = index.documents().unwrap_err();
        assert!(matches!(err, DocumentError::Corruption(_)));
    }

    #[test]
    fn test_stale_lock_blocks_writer() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("index.lock"), "held").unwrap();

        let index = DocumentIndex::open(temp_dir.path());
        let err = index.register("doc1", "document").unwrap_err();
        assert!(matches!(err, DocumentError::Index(_)));
    }

    #[test]
    fn test_lock_released_after_register() {
        let temp_dir = TempDir::new().unwrap();
        let index = DocumentIndex::open(temp_dir.path());

        index.register("doc1", "document").unwrap();
        assert!(!temp_dir.path().join("index.lock").exists());
        index.register("doc2", "document").unwrap();
    }
}
