//! Domain model (status, records, civil time).

pub mod civil_time;
pub mod state;
pub mod task;

pub use self::civil_time::{CIVIL_TIME_FORMAT, format_civil, parse_civil, parse_offset};
pub use self::state::TaskStatus;
pub use self::task::TaskRecord;
