//! PostgreSQL implementations of the store traits.

pub mod attendance;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod staff;
pub mod user;

pub use attendance::AttendanceLogRepository;
pub use machine::MachineRepository;
pub use notification::NotificationRepository;
pub use regularization::RegularizationRepository;
pub use staff::StaffRepository;
pub use user::UserRepository;

/// Whether a sqlx error is a unique-constraint violation.
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}
