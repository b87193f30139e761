//! Store traits consumed by the service layer.
//!
//! Each trait has a PostgreSQL implementation in
//! [`crate::repositories`] and an in-memory one in [`crate::memory`].

pub mod attendance;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod staff;
pub mod user;

pub use attendance::{AttendanceCounts, AttendanceFilter, AttendanceLogStore, CountBucket};
pub use machine::MachineStore;
pub use notification::NotificationStore;
pub use regularization::{RegularizationFilter, RegularizationStore, Resolution};
pub use staff::StaffStore;
pub use user::UserStore;
