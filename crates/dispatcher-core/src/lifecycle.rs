//! Lifecycle engine: state transitions over the ordered task list.
//!
//! Every function here is pure: it takes the records, the requester and
//! `now`, mutates in place and reports what happened. Locking and
//! persistence live in [`crate::dispatcher`].
//!
//! # 状態遷移
//! - Unfinished --claim--> Processing --complete--> Finished
//! - Processing --withdraw--> Unfinished
//! - Processing --reclaim(timeout)--> Unfinished

use chrono::{DateTime, Duration, FixedOffset, Utc};

use crate::domain::{TaskRecord, TaskStatus};
use crate::error::DispatchError;

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Assigned { pattern: String, execute_count: u32 },
    /// Steady state, not an error.
    NoTasks,
}

impl ClaimOutcome {
    pub fn pattern(&self) -> Option<&str> {
        match self {
            ClaimOutcome::Assigned { pattern, .. } => Some(pattern),
            ClaimOutcome::NoTasks => None,
        }
    }
}

fn require_worker(worker: &str) -> Result<(), DispatchError> {
    if worker.trim().is_empty() {
        return Err(DispatchError::EmptyWorker);
    }
    Ok(())
}

/// Hand the first Unfinished task (store order) to `worker`.
pub fn claim(
    records: &mut [TaskRecord],
    worker: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<ClaimOutcome, DispatchError> {
    require_worker(worker)?;

    let Some(record) = records.iter_mut().find(|r| r.status.is_claimable()) else {
        return Ok(ClaimOutcome::NoTasks);
    };
    record.mark_claimed(worker, now, offset);
    Ok(ClaimOutcome::Assigned {
        pattern: record.pattern.clone(),
        execute_count: record.execute_count,
    })
}

/// Mark `worker`'s Processing claim on `pattern` as Finished.
pub fn complete(
    records: &mut [TaskRecord],
    pattern: &str,
    worker: &str,
    now: DateTime<Utc>,
    offset: FixedOffset,
) -> Result<(), DispatchError> {
    require_worker(worker)?;
    if pattern.is_empty() {
        return Err(DispatchError::EmptyPattern);
    }

    let record = records
        .iter_mut()
        .find(|r| r.pattern == pattern && r.is_held_by(worker))
        .ok_or_else(|| DispatchError::NotFoundOrNotOwned {
            pattern: pattern.to_string(),
            worker: worker.to_string(),
        })?;
    record.mark_finished(now, offset);
    Ok(())
}

/// Put `worker`'s first Processing claim back to Unfinished.
///
/// Returns the released pattern. At most one task is released per call.
pub fn withdraw(records: &mut [TaskRecord], worker: &str) -> Result<String, DispatchError> {
    require_worker(worker)?;

    let record = records
        .iter_mut()
        .find(|r| r.is_held_by(worker))
        .ok_or_else(|| DispatchError::NoActiveClaim(worker.to_string()))?;
    record.release();
    Ok(record.pattern.clone())
}

/// Put `worker`'s claim on `pattern` back to Unfinished.
///
/// Same ownership rule as [`complete`]; a mismatch is the same conflated
/// not-found outcome.
pub fn release(
    records: &mut [TaskRecord],
    pattern: &str,
    worker: &str,
) -> Result<(), DispatchError> {
    require_worker(worker)?;
    if pattern.is_empty() {
        return Err(DispatchError::EmptyPattern);
    }

    let record = records
        .iter_mut()
        .find(|r| r.pattern == pattern && r.is_held_by(worker))
        .ok_or_else(|| DispatchError::NotFoundOrNotOwned {
            pattern: pattern.to_string(),
            worker: worker.to_string(),
        })?;
    record.release();
    Ok(())
}

/// Revert every Processing task assigned more than `timeout` before `now`.
///
/// Tasks whose `assigned_time` is missing or unparsable are left alone.
/// Returns the reverted patterns in store order.
pub fn reclaim_stale(
    records: &mut [TaskRecord],
    now: DateTime<Utc>,
    timeout: Duration,
    offset: FixedOffset,
) -> Vec<String> {
    let mut reclaimed = Vec::new();
    for record in records.iter_mut() {
        if record.status != TaskStatus::Processing {
            continue;
        }
        let Some(assigned_at) = record.assigned_at(offset) else {
            continue;
        };
        if now - assigned_at > timeout {
            record.reclaim();
            reclaimed.push(record.pattern.clone());
        }
    }
    reclaimed
}
