//! Approval workflow for edits to recorded attendance.
//!
//! Requests move `pending -> approved | rejected` exactly once. Approval
//! applies the requested change to the attendance log.

pub mod apply;
pub mod change;
pub mod service;

pub use change::RequestedChange;
pub use service::{NewRegularization, RegularizationOutcome, RegularizationService};
