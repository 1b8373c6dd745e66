//! Key-value storage media for the draft blob.
//!
//! A medium stores one text blob per key. [`FileStorage`] maps keys to JSON
//! files in a directory and replaces them atomically; [`MemoryStorage`] is an
//! in-process map with an optional byte quota.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use super::error::StorageError;

/// Text blob storage keyed by name.
pub trait StorageMedium: Send + Sync {
    /// Read the blob stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the blob stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the blob stored under `key`. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Copy the stored bytes under `from` to `to` without decoding them.
    ///
    /// Returns `false` when `from` holds nothing.
    fn copy(&self, from: &str, to: &str) -> Result<bool, StorageError>;
}

/// File-backed storage, one `<key>.json` file per key.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into(), quota: None }
    }

    /// Reject blobs larger than `quota` bytes.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let safe: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", safe))
    }
}

impl StorageMedium for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write_bytes(key, value.as_bytes())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn copy(&self, from: &str, to: &str) -> Result<bool, StorageError> {
        let bytes = match fs::read(self.path_for(from)) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        self.write_bytes(to, &bytes)?;
        Ok(true)
    }
}

impl FileStorage {
    fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if bytes.len() > quota {
                return Err(StorageError::QuotaExceeded { needed: bytes.len(), quota });
            }
        }

        fs::create_dir_all(&self.dir)?;

        // Write to a sibling temp file and rename over the target so readers
        // never observe a half-written blob.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        tmp.persist(self.path_for(key)).map_err(|e| StorageError::Persist(e.to_string()))?;

        tracing::trace!(key, bytes = bytes.len(), "Stored blob");
        Ok(())
    }
}

/// In-memory storage with an optional total byte quota.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create unbounded in-memory storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create in-memory storage that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self { entries: Mutex::new(HashMap::new()), quota: Some(quota) }
    }

    /// Total bytes stored.
    pub fn used_bytes(&self) -> usize {
        self.entries.lock().values().map(String::len).sum()
    }
}

impl StorageMedium for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock();

        if let Some(quota) = self.quota {
            let others: usize =
                entries.iter().filter(|(k, _)| k.as_str() != key).map(|(_, v)| v.len()).sum();
            let needed = others + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().remove(key);
        Ok(())
    }

    fn copy(&self, from: &str, to: &str) -> Result<bool, StorageError> {
        let value = self.entries.lock().get(from).cloned();
        match value {
            Some(value) => self.set(to, &value).map(|()| true),
            None => Ok(false),
        }
    }
}
