//! App - アプリケーション層
//!
//! # 主要コンポーネント
//! - **DispatcherBuilder**: ディスパッチャの構築とワイヤリング
//! - **ReaperLoop**: 放置された割り当ての定期回収
//! - **StatusCounts**: 状態ごとの件数

pub mod builder;
pub mod reaper_loop;
pub mod status;

pub use self::builder::{BuildError, DEFAULT_UTC_OFFSET, DispatcherBuilder};
pub use self::reaper_loop::{ReaperLoop, ReclaimPolicy};
pub use self::status::StatusCounts;
