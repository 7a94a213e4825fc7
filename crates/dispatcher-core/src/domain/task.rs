//! Task record: pattern + claim metadata.

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

use super::civil_time::{format_civil, parse_civil};
use super::state::TaskStatus;

/// One unit of work as stored in the snapshot.
///
/// Design:
/// - Field names and layout are the persisted document layout.
/// - Timestamps stay as civil strings so a snapshot round trip is exact,
///   including values the engine cannot parse.
/// - State transitions happen through the methods below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub pattern: String,

    #[serde(default)]
    pub status: TaskStatus,

    /// Current or last claim holder. Empty when Unfinished.
    #[serde(default)]
    pub worker_name: String,

    #[serde(default)]
    pub assigned_time: String,

    #[serde(default)]
    pub finished_time: String,

    /// Number of successful claims so far.
    #[serde(default)]
    pub execute_count: u32,
}

impl TaskRecord {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            status: TaskStatus::Unfinished,
            worker_name: String::new(),
            assigned_time: String::new(),
            finished_time: String::new(),
            execute_count: 0,
        }
    }

    /// Is this record held by `worker`?
    pub fn is_held_by(&self, worker: &str) -> bool {
        self.status == TaskStatus::Processing && self.worker_name == worker
    }

    /// Unfinished -> Processing.
    pub fn mark_claimed(&mut self, worker: &str, now: DateTime<Utc>, offset: FixedOffset) {
        self.status = TaskStatus::Processing;
        self.worker_name = worker.to_string();
        self.assigned_time = format_civil(now, offset);
        self.execute_count = self.execute_count.saturating_add(1);
    }

    /// Processing -> Finished.
    pub fn mark_finished(&mut self, now: DateTime<Utc>, offset: FixedOffset) {
        self.status = TaskStatus::Finished;
        self.finished_time = format_civil(now, offset);
    }

    /// Processing -> Unfinished on worker request.
    pub fn release(&mut self) {
        self.status = TaskStatus::Unfinished;
        self.worker_name.clear();
        self.assigned_time.clear();
        self.finished_time.clear();
    }

    /// Processing -> Unfinished after the claim went stale.
    pub fn reclaim(&mut self) {
        self.status = TaskStatus::Unfinished;
        self.worker_name.clear();
        self.assigned_time.clear();
    }

    /// `assigned_time` as an instant, if it parses.
    pub fn assigned_at(&self, offset: FixedOffset) -> Option<DateTime<Utc>> {
        parse_civil(&self.assigned_time, offset)
    }
}
