//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **JsonFileSnapshotStore**: 本番用（JSON ファイル）
//! - **InMemorySnapshotStore**: 開発用・テスト用

pub mod inmem_snapshot;
pub mod json_file;

pub use self::inmem_snapshot::InMemorySnapshotStore;
pub use self::json_file::JsonFileSnapshotStore;
