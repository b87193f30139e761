//! Route handlers organized by domain.

pub mod attendance;
pub mod health;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod staff;
