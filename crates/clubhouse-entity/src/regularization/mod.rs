//! Regularization request entities.

pub mod kind;
pub mod model;

pub use kind::{RegularizationStatus, RequestType};
pub use model::RegularizationRequest;
