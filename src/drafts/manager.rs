//! Draft manager: upsert/load/delete over the draft store.

use std::sync::mpsc::{self, Receiver, Sender};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::error::{DraftError, DraftResult};
use super::model::{Draft, DraftId};
use super::store::DraftStore;

/// Event emitted by the manager after a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEvent {
    /// A draft was saved
    Saved { id: DraftId, at: DateTime<Utc> },
    /// A draft was deleted
    Deleted { id: DraftId },
    /// All drafts were removed
    Cleared,
}

/// CRUD facade over the draft store.
#[derive(Debug)]
pub struct DraftManager {
    store: DraftStore,
    subscribers: Mutex<Vec<Sender<DraftEvent>>>,
}

impl DraftManager {
    /// Create a manager over `store`.
    pub fn new(store: DraftStore) -> Self {
        Self { store, subscribers: Mutex::new(Vec::new()) }
    }

    /// Underlying store.
    pub fn store(&self) -> &DraftStore {
        &self.store
    }

    /// Receive an event for every successful save, delete and clear.
    pub fn subscribe(&self) -> Receiver<DraftEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Insert or replace the draft with the same id.
    ///
    /// Drafts without a block report are rejected.
    pub fn save(&self, draft: &Draft) -> DraftResult<()> {
        if draft.block_report.is_none() {
            return Err(DraftError::MissingBlockReport);
        }

        let mut drafts = self.store.read_for_update()?;
        match drafts.iter_mut().find(|d| d.id == draft.id) {
            Some(existing) => *existing = draft.clone(),
            None => drafts.push(draft.clone()),
        }

        self.store.write_all(&drafts)?;

        tracing::debug!(draft_id = %draft.id, step = draft.step, "Saved draft");
        self.emit(DraftEvent::Saved { id: draft.id.clone(), at: Utc::now() });
        Ok(())
    }

    /// Look up a draft by id.
    pub fn load(&self, id: &DraftId) -> Option<Draft> {
        self.store.read_all().into_iter().find(|d| &d.id == id)
    }

    /// The in-progress draft, if one is stored.
    pub fn load_current(&self) -> Option<Draft> {
        self.load(&DraftId::Current)
    }

    /// All drafts, newest first.
    pub fn list(&self) -> Vec<Draft> {
        self.store.read_all()
    }

    /// Remove the draft with `id`. Removing an unknown id succeeds.
    pub fn delete(&self, id: &DraftId) -> DraftResult<()> {
        let drafts = self.store.read_for_update()?;
        let remaining: Vec<Draft> = drafts.into_iter().filter(|d| &d.id != id).collect();
        self.store.write_all(&remaining)?;

        tracing::debug!(draft_id = %id, "Deleted draft");
        self.emit(DraftEvent::Deleted { id: id.clone() });
        Ok(())
    }

    /// Remove every draft.
    pub fn clear_all(&self) -> DraftResult<()> {
        self.store.clear()?;

        tracing::debug!("Cleared all drafts");
        self.emit(DraftEvent::Cleared);
        Ok(())
    }

    /// Move the in-progress draft to a fresh named snapshot.
    ///
    /// Returns the snapshot id, or `None` when there is no in-progress draft.
    pub fn archive_current(&self) -> DraftResult<Option<DraftId>> {
        let mut drafts = self.store.read_for_update()?;
        let Some(current) = drafts.iter_mut().find(|d| d.id.is_current()) else {
            return Ok(None);
        };

        let id = DraftId::new_named();
        current.id = id.clone();
        self.store.write_all(&drafts)?;

        tracing::info!(draft_id = %id, "Archived in-progress draft");
        self.emit(DraftEvent::Deleted { id: DraftId::Current });
        Ok(Some(id))
    }

    fn emit(&self, event: DraftEvent) {
        // Drop subscribers whose receiver is gone
        self.subscribers.lock().retain(|tx| tx.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::drafts::model::BlockReport;
    use crate::drafts::storage::MemoryStorage;

    fn manager() -> DraftManager {
        DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::new())))
    }

    fn draft(id: DraftId, platform: &str) -> Draft {
        Draft::new(id, Utc::now())
            .with_block_report(BlockReport { platform: platform.to_string(), ..Default::default() })
    }

    #[test]
    fn test_save_then_load() {
        let manager = manager();
        let d = draft(DraftId::Current, "Uber");

        manager.save(&d).unwrap();
        assert_eq!(manager.load(&DraftId::Current), Some(d));
    }

    #[test]
    fn test_save_upserts_by_id() {
        let manager = manager();
        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        let second = draft(DraftId::Current, "99").with_step(2);
        manager.save(&second).unwrap();

        let all = manager.list();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0], second);
    }

    #[test]
    fn test_save_without_block_report_is_rejected() {
        let manager = manager();
        let d = Draft::new(DraftId::Current, Utc::now());

        assert!(matches!(manager.save(&d), Err(DraftError::MissingBlockReport)));
        assert!(manager.list().is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let manager = manager();
        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        manager.save(&draft(DraftId::from("keep"), "99")).unwrap();

        manager.delete(&DraftId::Current).unwrap();
        let once = manager.list();
        manager.delete(&DraftId::Current).unwrap();
        assert_eq!(manager.list(), once);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn test_clear_all() {
        let manager = manager();
        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        manager.clear_all().unwrap();
        assert!(manager.list().is_empty());
    }

    #[test]
    fn test_archive_current() {
        let manager = manager();
        assert!(manager.archive_current().unwrap().is_none());

        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        let id = manager.archive_current().unwrap().unwrap();

        assert!(manager.load_current().is_none());
        assert_eq!(manager.load(&id).unwrap().block_report.unwrap().platform, "Uber");
    }

    #[test]
    fn test_events_are_emitted() {
        let manager = manager();
        let rx = manager.subscribe();

        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        manager.delete(&DraftId::Current).unwrap();
        manager.clear_all().unwrap();

        assert!(matches!(rx.try_recv().unwrap(), DraftEvent::Saved { id: DraftId::Current, .. }));
        assert_eq!(rx.try_recv().unwrap(), DraftEvent::Deleted { id: DraftId::Current });
        assert_eq!(rx.try_recv().unwrap(), DraftEvent::Cleared);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_save_emits_nothing() {
        let manager = DraftManager::new(DraftStore::new(Arc::new(MemoryStorage::with_quota(8))));
        let rx = manager.subscribe();

        assert!(manager.save(&draft(DraftId::Current, "Uber")).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dropped_subscriber_is_pruned() {
        let manager = manager();
        drop(manager.subscribe());

        manager.save(&draft(DraftId::Current, "Uber")).unwrap();
        assert!(manager.subscribers.lock().is_empty());
    }
}
