//! Raw byte backends for the object store
//!
//! The store adapter never touches the filesystem directly; it goes through
//! `StoreBackend`, so an alternate backend handle can be injected via the
//! `object_store_backend` configuration option. Paths are relative,
//! `/`-separated, and scoped to one document's store.

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::RwLock;

use super::errors::{StoreError, StoreResult};

/// Byte-level backend for one document's object store.
pub trait StoreBackend: Send + Sync + std::fmt::Debug {
    /// Write data at path, atomically replacing any existing file.
    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()>;

    /// Create a file that must not yet exist. Returns false if it does.
    /// This is the primitive ref locks are built on.
    fn write_new(&self, path: &str, data: &[u8]) -> StoreResult<bool>;

    /// Read the full contents at path. `StoreError::NotFound` if absent.
    fn read(&self, path: &str) -> StoreResult<Vec<u8>>;

    /// Check whether path exists.
    fn exists(&self, path: &str) -> StoreResult<bool>;

    /// Remove the file at path; absent files are not an error.
    fn remove(&self, path: &str) -> StoreResult<()>;

    /// Create a directory (and parents). A no-op where directories do not
    /// exist as a concept.
    fn create_dir_all(&self, path: &str) -> StoreResult<()>;
}

/// Filesystem backend rooted at one document's directory.
#[derive(Debug)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new(root: PathBuf) -> Self {
        FsBackend { root }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path)
    }
}

impl StoreBackend for FsBackend {
    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write-then-rename so readers never observe a partial file. The
        // temp name appends to the full path (ref names may contain dots)
        // and carries the pid so concurrent writers never share it.
        let mut tmp_name = full_path.clone().into_os_string();
        tmp_name.push(format!(".tmp.{}", std::process::id()));
        let tmp_path = PathBuf::from(tmp_name);
        {
            let mut tmp = fs::File::create(&tmp_path)?;
            tmp.write_all(data)?;
            tmp.sync_all()?;
        }
        fs::rename(&tmp_path, &full_path)?;
        Ok(())
    }

    fn write_new(&self, path: &str, data: &[u8]) -> StoreResult<bool> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }
        match OpenOptions::new().write(true).create_new(true).open(&full_path) {
            Ok(mut file) => {
                file.write_all(data)?;
                file.sync_all()?;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        match fs::read(self.full_path(path)) {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        Ok(self.full_path(path).exists())
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        match fs::remove_file(self.full_path(path)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn create_dir_all(&self, path: &str) -> StoreResult<()> {
        fs::create_dir_all(self.full_path(path))?;
        Ok(())
    }
}

/// In-memory backend, used in unit tests and for ephemeral stores.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }
}

impl StoreBackend for MemoryBackend {
    fn write(&self, path: &str, data: &[u8]) -> StoreResult<()> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn write_new(&self, path: &str, data: &[u8]) -> StoreResult<bool> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        if files.contains_key(path) {
            return Ok(false);
        }
        files.insert(path.to_string(), data.to_vec());
        Ok(true)
    }

    fn read(&self, path: &str) -> StoreResult<Vec<u8>> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> StoreResult<bool> {
        let files = self.files.read().unwrap_or_else(|e| e.into_inner());
        // Directories are implicit: a marker entry or any file below counts.
        Ok(files.contains_key(path)
            || files.keys().any(|k| k.starts_with(&format!("{}/", path))))
    }

    fn remove(&self, path: &str) -> StoreResult<()> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.remove(path);
        Ok(())
    }

    fn create_dir_all(&self, path: &str) -> StoreResult<()> {
        let mut files = self.files.write().unwrap_or_else(|e| e.into_inner());
        files.entry(format!("{}/.dir", path)).or_default();
        Ok(())
    }
}
