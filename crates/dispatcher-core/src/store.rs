//! Task store: the ordered in-memory task list and its durable mirror.

use std::sync::Arc;

use crate::domain::TaskRecord;
use crate::ports::{SnapshotError, SnapshotStore};

/// Ordered task list owned by the dispatcher.
///
/// Design:
/// - Order is load order and never changes.
/// - Callers get slices only, so records can be mutated in place but never
///   inserted, removed or reordered.
/// - Locking is the dispatcher's job; this type has no interior mutability.
pub struct TaskStore {
    records: Vec<TaskRecord>,
    snapshots: Arc<dyn SnapshotStore>,
}

impl TaskStore {
    /// Empty store backed by `snapshots`.
    pub fn empty(snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            records: Vec::new(),
            snapshots,
        }
    }

    /// Populate from the latest snapshot.
    ///
    /// A read or decode failure is logged and leaves the store empty; the
    /// dispatcher still starts, just with nothing to hand out.
    pub async fn load(snapshots: Arc<dyn SnapshotStore>) -> Self {
        let records = match snapshots.load().await {
            Ok(records) => {
                tracing::info!(tasks = records.len(), "loaded task snapshot");
                records
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load task snapshot, starting empty");
                Vec::new()
            }
        };
        Self { records, snapshots }
    }

    /// Overwrite the durable snapshot with the full list.
    pub async fn snapshot(&self) -> Result<(), SnapshotError> {
        self.snapshots.save(&self.records).await
    }

    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TaskRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
