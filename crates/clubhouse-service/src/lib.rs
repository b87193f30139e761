//! # clubhouse-service
//!
//! Business logic for the attendance reconciliation pipeline. Each service
//! orchestrates the store traits and the device gateway to implement one
//! group of use cases.
//!
//! Services follow constructor injection; every dependency is provided at
//! construction time via `Arc` handles or cheap clones.

pub mod attendance;
pub mod context;
pub mod identity;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod services;

pub use attendance::{AttendanceService, IngestService, TimestampParser};
pub use context::RequestContext;
pub use identity::IdentityService;
pub use machine::MachineService;
pub use notification::NotificationService;
pub use regularization::RegularizationService;
pub use services::Services;
