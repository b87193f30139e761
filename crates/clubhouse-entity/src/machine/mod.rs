//! Biometric terminal domain entities.

pub mod model;
pub mod status;

pub use model::Machine;
pub use status::MachineStatus;
