//! Draft persistence.
//!
//! Wizard progress is snapshotted into [`Draft`] records and kept as one
//! collection on a key-value [`StorageMedium`]:
//!
//! - [`DraftStore`] - reads/writes the collection (newest first, versioned blob)
//! - [`DraftManager`] - upsert, load, delete and clear with change events
//! - [`SaveIndicator`] - "saved N minutes ago" display state

mod error;
mod indicator;
mod manager;
mod model;
mod storage;
mod store;

pub use error::{DraftError, DraftResult, StorageError};
pub use indicator::{time_ago, SaveIndicator};
pub use manager::{DraftEvent, DraftManager};
pub use model::{
    BlockReport, BlockType, CeasedProfits, Draft, DraftId, LegalDefense, WorkHistory,
    CURRENT_DRAFT_ID, TOTAL_STEPS,
};
pub use storage::{FileStorage, MemoryStorage, StorageMedium};
pub use store::{sort_newest_first, DraftStore, DEFAULT_DRAFTS_KEY, SCHEMA_VERSION};
