//! dispatcher-core
//!
//! Single-queue task dispatcher: workers claim a pattern, then complete or
//! withdraw it; stale claims are reclaimed on a timer.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（TaskStatus, TaskRecord, civil time）
//! - **ports**: 抽象化レイヤー（SnapshotStore, Clock）
//! - **impls**: ports の実装（JSON ファイル, InMemory）
//! - **store**: 順序付きタスク一覧と永続化
//! - **lifecycle**: 状態遷移ロジック（claim / complete / withdraw / reclaim）
//! - **dispatcher**: ロックを内包するサービス
//! - **app**: builder, reaper loop, status

pub mod app;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod impls;
pub mod lifecycle;
pub mod ports;
pub mod store;

pub use app::{BuildError, DispatcherBuilder, ReaperLoop, ReclaimPolicy, StatusCounts};
pub use dispatcher::TaskDispatcher;
pub use domain::{TaskRecord, TaskStatus};
pub use error::DispatchError;
pub use lifecycle::ClaimOutcome;
