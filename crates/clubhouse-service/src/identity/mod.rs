//! Mapping of terminal-local user ids to staff records.

pub mod service;

pub use service::{
    AssignmentResult, BulkProvisionReport, IdentityService, ProvisionEntry, StaffSummary,
    UnassignResult, derive_device_user_id,
};
