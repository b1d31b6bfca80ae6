//! File storage capability for design artifacts.
//!
//! The merge engine's atomicity contract lives at this seam: `write` is
//! all-or-nothing, so a document buffered in memory and written once is
//! never observable half-written. [`LocalFileStore`] implements that with
//! a temp-file write followed by a rename.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by the file storage layer.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to delete '{path}': {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file not found: '{0}'")]
    NotFound(PathBuf),
}

/// Capability over durable artifact storage.
pub trait FileStore {
    /// Write `bytes` under `path`, atomically replacing any previous
    /// content.
    fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()>;

    /// Read the content stored under `path`.
    fn read(&self, path: &Path) -> StorageResult<Vec<u8>>;

    /// Delete `path`. Returns false (not an error) if it was absent.
    fn delete(&self, path: &Path) -> StorageResult<bool>;

    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// File store backed by the local file system.
#[derive(Debug, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        LocalFileStore
    }
}

impl FileStore for LocalFileStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        let wrap = |source| StorageError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(wrap)?;
        }
        // Write-then-rename keeps a concurrent reader from ever seeing a
        // partial document.
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(wrap)?;
        fs::rename(&tmp, path).map_err(wrap)
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        fs::read(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => StorageError::NotFound(path.to_path_buf()),
            _ => StorageError::Read {
                path: path.to_path_buf(),
                source,
            },
        })
    }

    fn delete(&self, path: &Path) -> StorageResult<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StorageError::Delete {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// In-memory file store, used as the test double and for embedded use.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FileStore for MemoryFileStore {
    fn write(&self, path: &Path, bytes: &[u8]) -> StorageResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &Path) -> StorageResult<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.to_path_buf()))
    }

    fn delete(&self, path: &Path) -> StorageResult<bool> {
        Ok(self.files.lock().unwrap().remove(path).is_some())
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }
}
