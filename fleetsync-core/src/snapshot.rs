//! The process-wide "latest known fleet state" slot.
//!
//! One writer (the sync scheduler) replaces the whole snapshot at once; any
//! number of readers clone the current `Arc` and keep reading it while newer
//! snapshots are published. The lock guards only the pointer, never the
//! construction of a snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use crate::types::Snapshot;

/// Cheaply cloneable handle to the shared snapshot slot.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    slot: Arc<RwLock<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// A store whose current snapshot is empty (version 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot current at the time of the call.
    pub fn current(&self) -> Arc<Snapshot> {
        let guard = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the current snapshot, assigning it the next version number.
    ///
    /// Only the sync scheduler calls this.
    pub fn publish(&self, mut snapshot: Snapshot) -> Arc<Snapshot> {
        let mut guard = self.slot.write().unwrap_or_else(PoisonError::into_inner);
        snapshot.version = guard.version + 1;
        let published = Arc::new(snapshot);
        *guard = Arc::clone(&published);
        drop(guard);

        tracing::debug!(
            version = published.version,
            records = published.len(),
            "published snapshot",
        );
        published
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FleetRecord;

    #[test]
    fn current_is_empty_before_first_publish() {
        let store = SnapshotStore::new();
        let current = store.current();
        assert!(current.is_empty());
        assert_eq!(current.version, 0);
    }

    #[test]
    fn publish_assigns_increasing_versions() {
        let store = SnapshotStore::new();
        let first = store.publish(Snapshot::new(vec![FleetRecord::new("a")]));
        let second = store.publish(Snapshot::new(vec![]));
        assert_eq!(first.version, 1);
        assert_eq!(second.version, 2);
        assert_eq!(store.current().version, 2);
    }

    #[test]
    fn reader_keeps_old_snapshot_after_publish() {
        let store = SnapshotStore::new();
        store.publish(Snapshot::new(vec![FleetRecord::new("old")]));
        let held = store.current();
        store.publish(Snapshot::new(vec![FleetRecord::new("new")]));

        assert_eq!(held.records[0].address, "old");
        assert_eq!(store.current().records[0].address, "new");
    }

    #[test]
    fn clones_share_one_slot() {
        let writer = SnapshotStore::new();
        let reader = writer.clone();
        writer.publish(Snapshot::new(vec![FleetRecord::new("shared")]));
        assert_eq!(reader.current().records[0].address, "shared");
    }
}
