//! Task status state machine.

use serde::{Deserialize, Serialize};

/// TaskStatus はタスクの状態を表現
///
/// State transitions:
/// - Unfinished -> Processing (claim)
/// - Processing -> Finished (complete)
/// - Processing -> Unfinished (withdraw / reclaim)
///
/// Finished is terminal.
///
/// Persisted as an integer (`0`, `1`, `2`) so snapshots written by the
/// earlier service keep loading. That service stored whatever code a worker
/// sent, so any other integer is read back as Unfinished (with a warning)
/// instead of failing the whole load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub enum TaskStatus {
    /// Waiting for a worker.
    #[default]
    Unfinished,

    /// Claimed by a worker.
    Processing,

    /// Reported done by the claiming worker.
    Finished,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Finished)
    }

    /// Is this task eligible for claim?
    pub fn is_claimable(self) -> bool {
        matches!(self, TaskStatus::Unfinished)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Unfinished => "unfinished",
            TaskStatus::Processing => "processing",
            TaskStatus::Finished => "finished",
        }
    }
}

impl From<TaskStatus> for u8 {
    fn from(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Unfinished => 0,
            TaskStatus::Processing => 1,
            TaskStatus::Finished => 2,
        }
    }
}

impl TaskStatus {
    /// Strict decode of a status code.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Unfinished),
            1 => Some(TaskStatus::Processing),
            2 => Some(TaskStatus::Finished),
            _ => None,
        }
    }
}

impl From<i64> for TaskStatus {
    fn from(code: i64) -> Self {
        TaskStatus::from_code(code).unwrap_or_else(|| {
            tracing::warn!(code, "unknown task status code, treating as unfinished");
            TaskStatus::Unfinished
        })
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
