//! JsonFileSnapshotStore - JSON ファイルへの永続化
//!
//! # 実装詳細
//! - 読み込みはファイル全体を一度に読む
//! - 書き込みは `<path>.tmp` に書いてから rename で差し替える
//!   （途中でクラッシュしても直前のスナップショットが残る）

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::TaskRecord;
use crate::ports::{SnapshotError, SnapshotStore};

/// Snapshot kept as one JSON array on disk.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl SnapshotStore for JsonFileSnapshotStore {
    async fn load(&self) -> Result<Vec<TaskRecord>, SnapshotError> {
        let data = tokio::fs::read(&self.path).await?;
        let records = serde_json::from_slice(&data)?;
        Ok(records)
    }

    async fn save(&self, records: &[TaskRecord]) -> Result<(), SnapshotError> {
        let data = serde_json::to_vec_pretty(records)?;
        let tmp = self.temp_path();

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&data).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
