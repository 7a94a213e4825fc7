//! Status - 状態ごとの件数

use serde::{Deserialize, Serialize};

/// Observability view of the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub unfinished: usize,
    pub processing: usize,
    pub finished: usize,
    pub total: usize,

    /// Snapshot writes that failed since start (memory ahead of disk).
    pub persist_failures: u64,
}
