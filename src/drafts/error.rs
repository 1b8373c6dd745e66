//! Draft persistence error types.

use thiserror::Error;

/// Result type for draft operations.
pub type DraftResult<T> = Result<T, DraftError>;

/// Errors raised by a storage medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The write would exceed the medium's quota.
    #[error("Storage quota exceeded: {needed} bytes needed, quota is {quota} bytes")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Atomic replace of the stored blob failed.
    #[error("Failed to persist blob: {0}")]
    Persist(String),
}

/// Errors that can occur while reading or writing drafts.
#[derive(Debug, Error)]
pub enum DraftError {
    /// Underlying storage failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The stored blob could not be interpreted.
    #[error("Stored drafts are corrupt: {0}")]
    Corrupt(String),

    /// The stored blob was written by a newer schema.
    #[error("Unsupported draft schema version {0}")]
    UnsupportedVersion(u32),

    /// Drafts are only persisted once the block report exists.
    #[error("Draft has no block report and cannot be saved")]
    MissingBlockReport,
}
