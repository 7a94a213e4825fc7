//! InMemorySnapshotStore - 開発用・テスト用のスナップショット
//!
//! # 学習ポイント
//! - 保存失敗を意図的に起こして、永続化ギャップの扱いを確認できる

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::domain::TaskRecord;
use crate::ports::{SnapshotError, SnapshotStore};

/// Keeps the last saved document in memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    /// `None` means "nothing saved yet" and makes `load` fail like a missing file.
    saved: Mutex<Option<Vec<TaskRecord>>>,
    fail_saves: AtomicBool,
    save_count: AtomicUsize,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing snapshot.
    pub fn with_records(records: Vec<TaskRecord>) -> Self {
        Self {
            saved: Mutex::new(Some(records)),
            ..Self::default()
        }
    }

    /// Make subsequent `save` calls fail (or succeed again).
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.save_count.load(Ordering::SeqCst)
    }

    /// Last successfully saved document.
    pub fn saved(&self) -> Option<Vec<TaskRecord>> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn load(&self) -> Result<Vec<TaskRecord>, SnapshotError> {
        self.saved().ok_or_else(|| {
            SnapshotError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no snapshot saved",
            ))
        })
    }

    async fn save(&self, records: &[TaskRecord]) -> Result<(), SnapshotError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(SnapshotError::Rejected("save disabled".to_string()));
        }
        let mut guard = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some(records.to_vec());
        self.save_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
