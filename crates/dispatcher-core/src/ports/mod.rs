//! Ports - 抽象化レイヤー
//!
//! 各 trait は外部リソース（ファイル、時計）へのインターフェースを提供し、
//! 実装の詳細を隠蔽します。

pub mod clock;
pub mod snapshot_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::snapshot_store::{SnapshotError, SnapshotStore};
