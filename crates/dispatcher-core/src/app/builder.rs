//! DispatcherBuilder - ディスパッチャの構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）

use std::sync::Arc;

use chrono::FixedOffset;

use crate::dispatcher::TaskDispatcher;
use crate::domain::parse_offset;
use crate::ports::{Clock, SnapshotStore, SystemClock};
use crate::store::TaskStore;

/// DispatcherBuilder はディスパッチャを構築
///
/// # 使用例
/// ```ignore
/// let dispatcher = DispatcherBuilder::new()
///     .snapshot_store(Arc::new(JsonFileSnapshotStore::new("task.json")))
///     .utc_offset("+08:00")
///     .build()
///     .await?;
/// ```
///
/// # Fail-fast 設計
/// - snapshot store が未設定なら BuildError
/// - オフセットが解釈できなければ BuildError
/// - スナップショットの読み込み失敗は致命的ではない（空で起動）
pub struct DispatcherBuilder {
    snapshots: Option<Arc<dyn SnapshotStore>>,
    clock: Arc<dyn Clock>,
    utc_offset: String,
}

/// BuildError はディスパッチャ構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("No snapshot store configured.")]
    MissingSnapshotStore,

    #[error("Invalid UTC offset '{0}'. Expected something like +08:00.")]
    InvalidOffset(String),
}

/// Offset used when none is configured.
pub const DEFAULT_UTC_OFFSET: &str = "+08:00";

impl DispatcherBuilder {
    pub fn new() -> Self {
        Self {
            snapshots: None,
            clock: Arc::new(SystemClock),
            utc_offset: DEFAULT_UTC_OFFSET.to_string(),
        }
    }

    pub fn snapshot_store(mut self, snapshots: Arc<dyn SnapshotStore>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    /// Replace the wall clock (tests).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Civil offset for timestamps, e.g. `+08:00`.
    pub fn utc_offset(mut self, offset: impl Into<String>) -> Self {
        self.utc_offset = offset.into();
        self
    }

    /// Validate settings, load the snapshot and build the dispatcher.
    pub async fn build(self) -> Result<TaskDispatcher, BuildError> {
        let snapshots = self.snapshots.ok_or(BuildError::MissingSnapshotStore)?;
        let offset: FixedOffset = parse_offset(&self.utc_offset)
            .ok_or_else(|| BuildError::InvalidOffset(self.utc_offset.clone()))?;

        let store = TaskStore::load(snapshots).await;
        Ok(TaskDispatcher::new(store, self.clock, offset))
    }
}

impl Default for DispatcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TaskRecord;
    use crate::impls::InMemorySnapshotStore;

    #[tokio::test]
    async fn test_build_success() {
        let dispatcher = DispatcherBuilder::new()
            .snapshot_store(Arc::new(InMemorySnapshotStore::with_records(vec![
                TaskRecord::new("p1"),
            ])))
            .build()
            .await
            .unwrap();

        assert_eq!(dispatcher.offset().local_minus_utc(), 8 * 3600);
        assert_eq!(dispatcher.status().await.total, 1);
    }

    #[tokio::test]
    async fn test_build_missing_snapshot_store() {
        let result = DispatcherBuilder::new().build().await;
        assert!(matches!(result, Err(BuildError::MissingSnapshotStore)));
    }

    #[tokio::test]
    async fn test_build_invalid_offset() {
        let result = DispatcherBuilder::new()
            .snapshot_store(Arc::new(InMemorySnapshotStore::new()))
            .utc_offset("noon")
            .build()
            .await;
        assert!(matches!(result, Err(BuildError::InvalidOffset(s)) if s == "noon"));
    }

    #[tokio::test]
    async fn test_build_with_unreadable_snapshot_starts_empty() {
        let dispatcher = DispatcherBuilder::new()
            .snapshot_store(Arc::new(InMemorySnapshotStore::new()))
            .utc_offset("-03:00")
            .build()
            .await
            .unwrap();

        assert_eq!(dispatcher.status().await.total, 0);
        assert_eq!(dispatcher.offset().local_minus_utc(), -3 * 3600);
    }
}
