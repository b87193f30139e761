//! Attendance log domain entities.

pub mod kind;
pub mod model;

pub use kind::{PunchStatus, PunchType, VerifyMethod};
pub use model::{AttendanceLog, DedupKey};
