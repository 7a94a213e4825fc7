//! TaskDispatcher - ロック・時計・永続化をまとめたサービス
//!
//! Every public operation is one critical section:
//! lock → O(n) scan → mutate → full snapshot → unlock.
//! The lock is held across the snapshot write so no caller ever sees a
//! state that has not at least been handed to the snapshot store.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{Duration, FixedOffset};
use tokio::sync::Mutex;

use crate::app::status::StatusCounts;
use crate::domain::{TaskRecord, TaskStatus};
use crate::error::DispatchError;
use crate::lifecycle::{self, ClaimOutcome};
use crate::ports::Clock;
use crate::store::TaskStore;

/// Single-queue dispatcher service.
///
/// Design:
/// - Owns the [`TaskStore`]; callers never see the lock.
/// - Handlers and the reaper share one instance through `Arc`.
/// - A failed snapshot write keeps the in-memory change and is counted.
pub struct TaskDispatcher {
    store: Mutex<TaskStore>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
    persist_failures: AtomicU64,
}

impl TaskDispatcher {
    pub fn new(store: TaskStore, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        Self {
            store: Mutex::new(store),
            clock,
            offset,
            persist_failures: AtomicU64::new(0),
        }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Claim the first Unfinished task for `worker`.
    ///
    /// `reported_count` is the caller's own execution counter; it is only logged.
    pub async fn claim(
        &self,
        worker: &str,
        reported_count: Option<u32>,
    ) -> Result<ClaimOutcome, DispatchError> {
        let mut store = self.store.lock().await;
        let now = self.clock.now();
        let outcome = lifecycle::claim(store.records_mut(), worker, now, self.offset)?;

        match &outcome {
            ClaimOutcome::Assigned {
                pattern,
                execute_count,
            } => {
                tracing::info!(
                    worker,
                    pattern = %pattern,
                    execute_count,
                    reported_count = ?reported_count,
                    "task claimed"
                );
                self.persist(&store, "claim").await;
            }
            ClaimOutcome::NoTasks => {
                tracing::debug!(worker, "no tasks available");
            }
        }
        Ok(outcome)
    }

    /// Finish `worker`'s claim on `pattern`.
    pub async fn complete(&self, pattern: &str, worker: &str) -> Result<(), DispatchError> {
        let mut store = self.store.lock().await;
        let now = self.clock.now();
        if let Err(e) = lifecycle::complete(store.records_mut(), pattern, worker, now, self.offset)
        {
            tracing::debug!(worker, pattern, error = %e, "complete rejected");
            return Err(e);
        }

        tracing::info!(worker, pattern, "task finished");
        self.persist(&store, "complete").await;
        Ok(())
    }

    /// Release `worker`'s first claim back to Unfinished.
    pub async fn withdraw(&self, worker: &str) -> Result<String, DispatchError> {
        let mut store = self.store.lock().await;
        let pattern = match lifecycle::withdraw(store.records_mut(), worker) {
            Ok(pattern) => pattern,
            Err(e) => {
                tracing::debug!(worker, error = %e, "withdraw rejected");
                return Err(e);
            }
        };

        tracing::info!(worker, pattern = %pattern, "task withdrawn");
        self.persist(&store, "withdraw").await;
        Ok(pattern)
    }

    /// Give back `worker`'s claim on a specific `pattern`.
    pub async fn release(&self, pattern: &str, worker: &str) -> Result<(), DispatchError> {
        let mut store = self.store.lock().await;
        if let Err(e) = lifecycle::release(store.records_mut(), pattern, worker) {
            tracing::debug!(worker, pattern, error = %e, "release rejected");
            return Err(e);
        }

        tracing::info!(worker, pattern, "task released");
        self.persist(&store, "release").await;
        Ok(())
    }

    /// Revert claims older than `timeout`. Returns the reverted patterns.
    pub async fn reclaim_stale(&self, timeout: std::time::Duration) -> Vec<String> {
        let timeout = Duration::from_std(timeout).unwrap_or(Duration::MAX);
        let mut store = self.store.lock().await;
        let now = self.clock.now();
        let reclaimed = lifecycle::reclaim_stale(store.records_mut(), now, timeout, self.offset);

        if reclaimed.is_empty() {
            tracing::debug!("reclaim sweep found no stale tasks");
        } else {
            tracing::info!(count = reclaimed.len(), patterns = ?reclaimed, "reclaimed stale tasks");
            self.persist(&store, "reclaim").await;
        }
        reclaimed
    }

    /// Counts per status.
    pub async fn status(&self) -> StatusCounts {
        let store = self.store.lock().await;
        let mut counts = StatusCounts::default();
        for record in store.records() {
            match record.status {
                TaskStatus::Unfinished => counts.unfinished += 1,
                TaskStatus::Processing => counts.processing += 1,
                TaskStatus::Finished => counts.finished += 1,
            }
        }
        counts.total = store.len();
        counts.persist_failures = self.persist_failures.load(Ordering::Relaxed);
        counts
    }

    /// Copy of the current task list, in store order.
    pub async fn tasks(&self) -> Vec<TaskRecord> {
        self.store.lock().await.records().to_vec()
    }

    async fn persist(&self, store: &TaskStore, op: &'static str) {
        if let Err(e) = store.snapshot().await {
            self.persist_failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(op, error = %e, "failed to write task snapshot, memory is ahead of disk");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::InMemorySnapshotStore;
    use crate::ports::FixedClock;
    use chrono::{TimeZone, Utc};

    struct Fixture {
        dispatcher: Arc<TaskDispatcher>,
        snapshots: Arc<InMemorySnapshotStore>,
        clock: Arc<FixedClock>,
    }

    async fn fixture(patterns: &[&str]) -> Fixture {
        let records = patterns.iter().map(|p| TaskRecord::new(*p)).collect();
        let snapshots = Arc::new(InMemorySnapshotStore::with_records(records));
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        ));
        let store = TaskStore::load(snapshots.clone()).await;
        let dispatcher = Arc::new(TaskDispatcher::new(
            store,
            clock.clone(),
            FixedOffset::east_opt(8 * 3600).unwrap(),
        ));
        Fixture {
            dispatcher,
            snapshots,
            clock,
        }
    }

    #[tokio::test]
    async fn every_mutation_is_snapshotted() {
        let f = fixture(&["p1"]).await;

        f.dispatcher.claim("w1", None).await.unwrap();
        assert_eq!(f.snapshots.save_count(), 1);
        assert_eq!(f.snapshots.saved().unwrap(), f.dispatcher.tasks().await);

        f.dispatcher.complete("p1", "w1").await.unwrap();
        assert_eq!(f.snapshots.save_count(), 2);
        let saved = f.snapshots.saved().unwrap();
        assert_eq!(saved[0].status, TaskStatus::Finished);
        assert_eq!(saved[0].finished_time, "2024-01-01 08:00:00");
    }

    #[tokio::test]
    async fn rejected_operations_do_not_write() {
        let f = fixture(&["p1"]).await;

        assert!(f.dispatcher.withdraw("w1").await.is_err());
        assert!(f.dispatcher.complete("p1", "w1").await.is_err());
        f.dispatcher.claim("w1", None).await.unwrap();
        f.dispatcher.claim("w2", None).await.unwrap();

        assert_eq!(f.snapshots.save_count(), 1);
    }

    #[tokio::test]
    async fn failed_snapshot_keeps_memory_change() {
        let f = fixture(&["p1"]).await;
        f.snapshots.set_fail_saves(true);

        let outcome = f.dispatcher.claim("w1", Some(4)).await.unwrap();

        assert_eq!(outcome.pattern(), Some("p1"));
        let tasks = f.dispatcher.tasks().await;
        assert_eq!(tasks[0].status, TaskStatus::Processing);
        assert_eq!(f.snapshots.saved().unwrap()[0].status, TaskStatus::Unfinished);
        assert_eq!(f.dispatcher.status().await.persist_failures, 1);

        f.snapshots.set_fail_saves(false);
        f.dispatcher.complete("p1", "w1").await.unwrap();
        assert_eq!(f.snapshots.saved().unwrap(), f.dispatcher.tasks().await);
    }

    #[tokio::test]
    async fn reclaim_uses_clock_and_persists_once() {
        let f = fixture(&["a", "b", "c"]).await;
        f.dispatcher.claim("w1", None).await.unwrap();
        f.dispatcher.claim("w2", None).await.unwrap();
        let saves_before = f.snapshots.save_count();

        let timeout = std::time::Duration::from_secs(3 * 3600);
        f.clock.advance(Duration::hours(3) - Duration::seconds(1));
        assert!(f.dispatcher.reclaim_stale(timeout).await.is_empty());
        assert_eq!(f.snapshots.save_count(), saves_before);

        f.clock.advance(Duration::seconds(2));
        let reclaimed = f.dispatcher.reclaim_stale(timeout).await;
        assert_eq!(reclaimed, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(f.snapshots.save_count(), saves_before + 1);

        let status = f.dispatcher.status().await;
        assert_eq!(status.unfinished, 3);
        assert_eq!(status.processing, 0);
    }

    #[tokio::test]
    async fn status_counts_each_state() {
        let f = fixture(&["a", "b", "c"]).await;
        f.dispatcher.claim("w1", None).await.unwrap();
        f.dispatcher.claim("w2", None).await.unwrap();
        f.dispatcher.complete("a", "w1").await.unwrap();

        let status = f.dispatcher.status().await;
        assert_eq!(
            status,
            StatusCounts {
                unfinished: 1,
                processing: 1,
                finished: 1,
                total: 3,
                persist_failures: 0,
            }
        );
    }

    #[tokio::test]
    async fn concurrent_claims_never_share_a_task() {
        let patterns: Vec<String> = (0..50).map(|i| format!("p{i}")).collect();
        let refs: Vec<&str> = patterns.iter().map(String::as_str).collect();
        let f = fixture(&refs).await;

        let mut joins = Vec::new();
        for worker in 0..80 {
            let dispatcher = Arc::clone(&f.dispatcher);
            joins.push(tokio::spawn(async move {
                dispatcher.claim(&format!("w{worker}"), None).await.unwrap()
            }));
        }

        let mut claimed = Vec::new();
        let mut empty = 0;
        for join in joins {
            match join.await.unwrap() {
                ClaimOutcome::Assigned { pattern, .. } => claimed.push(pattern),
                ClaimOutcome::NoTasks => empty += 1,
            }
        }

        claimed.sort();
        claimed.dedup();
        assert_eq!(claimed.len(), 50);
        assert_eq!(empty, 30);
        assert!(
            f.dispatcher
                .tasks()
                .await
                .iter()
                .all(|t| t.status == TaskStatus::Processing && t.execute_count == 1)
        );
    }
}
