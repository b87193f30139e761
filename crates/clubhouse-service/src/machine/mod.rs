//! Registered terminal management.

pub mod service;

pub use service::{
    ConnectionTest, CreateMachine, MachineDetail, MachineService, ScanRequest, UpdateMachine,
};

use clubhouse_core::error::AppError;
use clubhouse_database::store::MachineStore;
use clubhouse_device::{DeviceEndpoint, DeviceGateway};
use clubhouse_entity::machine::Machine;

/// Network address of a registered machine.
pub(crate) fn endpoint_of(gateway: &DeviceGateway, machine: &Machine) -> DeviceEndpoint {
    DeviceEndpoint::new(
        machine.ip_address.clone(),
        machine.port_or(gateway.default_port()),
    )
}

/// Look up a machine by operator id; absent and inactive are both NotFound.
pub(crate) async fn find_active_machine(
    machines: &dyn MachineStore,
    machine_id: &str,
) -> Result<Machine, AppError> {
    machines
        .find_by_machine_id(machine_id)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(|| AppError::not_found(format!("Machine '{machine_id}' not found or inactive")))
}
