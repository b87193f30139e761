//! Operator account entities.

pub mod model;
pub mod role;

pub use model::User;
pub use role::UserRole;
