//! SnapshotStore port - タスク一覧の永続化先
//!
//! The whole ordered task list is read once at start and rewritten in full
//! after every mutation. There is no incremental log.

use async_trait::async_trait;

use crate::domain::TaskRecord;

/// SnapshotError は永続化の失敗
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("snapshot write rejected: {0}")]
    Rejected(String),
}

/// Durable copy of the task list.
///
/// # 設計原則
/// - `save` は常に全件を上書き（部分更新なし）
/// - 順序は保存した順のまま `load` で戻る
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the latest snapshot.
    async fn load(&self) -> Result<Vec<TaskRecord>, SnapshotError>;

    /// Overwrite the snapshot with `records`.
    async fn save(&self, records: &[TaskRecord]) -> Result<(), SnapshotError>;
}
