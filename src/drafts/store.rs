//! Persistent store adapter for the draft collection.
//!
//! The whole collection lives in one blob under a single namespaced key:
//!
//! ```json
//! { "version": 1, "drafts": [ { "id": "current", "timestamp": "...", ... } ] }
//! ```
//!
//! A bare JSON array is the unversioned legacy layout and is migrated on read.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{DraftError, DraftResult};
use super::model::Draft;
use super::storage::StorageMedium;

/// Current schema version of the stored blob.
pub const SCHEMA_VERSION: u32 = 1;

/// Default key the collection is stored under.
pub const DEFAULT_DRAFTS_KEY: &str = "driver-defense-drafts";

/// Suffix of the key a blob that failed to load is copied to.
const CORRUPT_SUFFIX: &str = ".corrupt";

#[derive(Debug, Serialize, Deserialize)]
struct DraftCollection {
    version: u32,
    #[serde(default)]
    drafts: Vec<Draft>,
}

/// Reads and writes the draft collection on a storage medium.
#[derive(Clone)]
pub struct DraftStore {
    medium: Arc<dyn StorageMedium>,
    key: String,
}

impl DraftStore {
    /// Create a store over `medium` using the default key.
    pub fn new(medium: Arc<dyn StorageMedium>) -> Self {
        Self { medium, key: DEFAULT_DRAFTS_KEY.to_string() }
    }

    /// Use a custom key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Key the collection is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Key a corrupt blob is preserved under.
    pub fn corrupt_key(&self) -> String {
        format!("{}{}", self.key, CORRUPT_SUFFIX)
    }

    /// All drafts, newest first.
    ///
    /// Never fails: a missing blob yields an empty list, and an unreadable one
    /// is logged, copied to [`corrupt_key`](Self::corrupt_key) and treated as
    /// empty.
    pub fn read_all(&self) -> Vec<Draft> {
        match self.try_read_all() {
            Ok(drafts) => drafts,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "Failed to load drafts, treating as empty");
                if let Err(e) = self.preserve_unreadable() {
                    tracing::warn!(key = %self.corrupt_key(), error = %e, "Failed to preserve unreadable drafts");
                }
                Vec::new()
            }
        }
    }

    /// All drafts, read ahead of a write that replaces the collection.
    ///
    /// An unreadable blob is treated as empty only once it has been copied to
    /// [`corrupt_key`](Self::corrupt_key). If the copy fails the read error is
    /// returned and nothing may be written.
    pub fn read_for_update(&self) -> DraftResult<Vec<Draft>> {
        match self.try_read_all() {
            Ok(drafts) => Ok(drafts),
            Err(e) => match self.preserve_unreadable() {
                Ok(true) => {
                    tracing::warn!(key = %self.key, error = %e, "Replacing unreadable drafts, copy kept");
                    Ok(Vec::new())
                }
                Ok(false) => Err(e),
                Err(copy_err) => {
                    tracing::error!(
                        key = %self.corrupt_key(),
                        error = %copy_err,
                        "Failed to preserve unreadable drafts, refusing to overwrite"
                    );
                    Err(e)
                }
            },
        }
    }

    /// All drafts, newest first, surfacing read and decode failures.
    pub fn try_read_all(&self) -> DraftResult<Vec<Draft>> {
        let Some(raw) = self.medium.get(&self.key)? else {
            return Ok(Vec::new());
        };

        let mut drafts = decode(&raw)?;
        sort_newest_first(&mut drafts);
        Ok(drafts)
    }

    /// Replace the whole collection with a single write.
    pub fn write_all(&self, drafts: &[Draft]) -> DraftResult<()> {
        let collection = DraftCollection { version: SCHEMA_VERSION, drafts: drafts.to_vec() };
        let raw = serde_json::to_string(&collection)?;
        self.medium.set(&self.key, &raw)?;

        tracing::debug!(key = %self.key, count = drafts.len(), "Wrote draft collection");
        Ok(())
    }

    /// Remove the whole collection.
    pub fn clear(&self) -> DraftResult<()> {
        self.medium.remove(&self.key)?;
        Ok(())
    }

    fn preserve_unreadable(&self) -> DraftResult<bool> {
        Ok(self.medium.copy(&self.key, &self.corrupt_key())?)
    }
}

impl std::fmt::Debug for DraftStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DraftStore").field("key", &self.key).finish()
    }
}

/// Sort newest first. The sort is stable, so equal timestamps keep their
/// stored order.
pub fn sort_newest_first(drafts: &mut [Draft]) {
    drafts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}

fn decode(raw: &str) -> DraftResult<Vec<Draft>> {
    let value: Value = serde_json::from_str(raw).map_err(|e| DraftError::Corrupt(e.to_string()))?;
    migrate(value)
}

/// Bring a stored value of any known version to the current layout.
fn migrate(value: Value) -> DraftResult<Vec<Draft>> {
    match value {
        // Version 0: bare array of drafts
        Value::Array(_) => {
            let drafts: Vec<Draft> =
                serde_json::from_value(value).map_err(|e| DraftError::Corrupt(e.to_string()))?;
            tracing::info!(count = drafts.len(), "Migrated legacy draft collection");
            Ok(drafts)
        }
        Value::Object(ref map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .ok_or_else(|| DraftError::Corrupt("missing schema version".to_string()))?;
            let version = u32::try_from(version).unwrap_or(u32::MAX);
            if version > SCHEMA_VERSION {
                return Err(DraftError::UnsupportedVersion(version));
            }

            let collection: DraftCollection =
                serde_json::from_value(value).map_err(|e| DraftError::Corrupt(e.to_string()))?;
            Ok(collection.drafts)
        }
        other => Err(DraftError::Corrupt(format!("unexpected top-level value: {}", other))),
    }
}
