//! Machine CRUD, connection tests and network discovery.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_database::store::{AttendanceLogStore, MachineStore, StaffStore};
use clubhouse_device::scan::expand_targets;
use clubhouse_device::{DeviceGateway, DeviceInfo, DeviceStatus, ScanHit};
use clubhouse_entity::machine::{Machine, MachineStatus};

use super::endpoint_of;

/// Input for registering a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMachine {
    pub machine_id: String,
    pub name: String,
    pub ip_address: String,
    pub port: Option<u16>,
    pub location: Option<String>,
}

/// Partial update of a machine. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMachine {
    pub name: Option<String>,
    pub ip_address: Option<String>,
    pub port: Option<u16>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

/// A machine with counts computed from the stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineDetail {
    #[serde(flatten)]
    pub machine: Machine,
    pub authoritative_users: u64,
    pub authoritative_logs: u64,
}

/// Outcome of a connection test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionTest {
    pub machine_id: String,
    pub status: DeviceStatus,
    pub info: Option<DeviceInfo>,
    pub checked_at: DateTime<Utc>,
}

/// Address range for a network scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// First three octets, e.g. `192.168.1`.
    pub prefix: String,
    pub start: u8,
    pub end: u8,
    pub ports: Vec<u16>,
}

/// Manages registered terminals.
#[derive(Debug, Clone)]
pub struct MachineService {
    machines: Arc<dyn MachineStore>,
    attendance: Arc<dyn AttendanceLogStore>,
    staff: Arc<dyn StaffStore>,
    gateway: DeviceGateway,
}

fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn require_port(port: u16) -> Result<i32, AppError> {
    if port == 0 {
        return Err(AppError::validation("Port must be between 1 and 65535"));
    }
    Ok(i32::from(port))
}

impl MachineService {
    /// Creates a new machine service.
    pub fn new(
        machines: Arc<dyn MachineStore>,
        attendance: Arc<dyn AttendanceLogStore>,
        staff: Arc<dyn StaffStore>,
        gateway: DeviceGateway,
    ) -> Self {
        Self {
            machines,
            attendance,
            staff,
            gateway,
        }
    }

    /// Lists machines, active ones only unless `include_inactive`.
    pub async fn list(&self, include_inactive: bool) -> Result<Vec<Machine>, AppError> {
        self.machines.list(include_inactive).await
    }

    async fn find(&self, id: Uuid) -> Result<Machine, AppError> {
        self.machines
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Machine {id} not found")))
    }

    /// Gets a machine with live user and log counts.
    pub async fn get(&self, id: Uuid) -> Result<MachineDetail, AppError> {
        let machine = self.find(id).await?;
        let authoritative_users = self.staff.count_assigned(&machine.machine_id).await?;
        let authoritative_logs = self.attendance.count_for_machine(&machine.machine_id).await?;
        Ok(MachineDetail {
            machine,
            authoritative_users,
            authoritative_logs,
        })
    }

    /// Registers a machine.
    pub async fn create(&self, input: CreateMachine) -> Result<Machine, AppError> {
        require_text("machine_id", &input.machine_id)?;
        require_text("name", &input.name)?;
        require_text("ip_address", &input.ip_address)?;
        let port = require_port(input.port.unwrap_or(self.gateway.default_port()))?;

        let now = Utc::now();
        let machine = Machine {
            id: Uuid::new_v4(),
            machine_id: input.machine_id.trim().to_string(),
            name: input.name.trim().to_string(),
            ip_address: input.ip_address.trim().to_string(),
            port,
            location: input.location,
            status: MachineStatus::Unknown,
            last_seen_at: None,
            is_active: true,
            total_users: 0,
            total_logs: 0,
            created_at: now,
            updated_at: now,
        };
        let created = self.machines.create(&machine).await?;
        info!(machine_id = %created.machine_id, ip = %created.ip_address, "Machine registered");
        Ok(created)
    }

    /// Applies a partial update.
    pub async fn update(&self, id: Uuid, input: UpdateMachine) -> Result<Machine, AppError> {
        let mut machine = self.find(id).await?;
        if let Some(name) = input.name {
            require_text("name", &name)?;
            machine.name = name.trim().to_string();
        }
        if let Some(ip) = input.ip_address {
            require_text("ip_address", &ip)?;
            machine.ip_address = ip.trim().to_string();
        }
        if let Some(port) = input.port {
            machine.port = require_port(port)?;
        }
        if input.location.is_some() {
            machine.location = input.location;
        }
        if let Some(active) = input.is_active {
            machine.is_active = active;
        }
        machine.updated_at = Utc::now();
        self.machines.update(&machine).await
    }

    /// Deactivates a machine. Its logs are kept.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if !self.machines.soft_delete(id).await? {
            return Err(AppError::not_found(format!("Machine {id} not found")));
        }
        info!(id = %id, "Machine deactivated");
        Ok(())
    }

    /// Checks reachability and records the result on the machine.
    pub async fn test_connection(&self, id: Uuid) -> Result<ConnectionTest, AppError> {
        let machine = self.find(id).await?;
        let endpoint = endpoint_of(&self.gateway, &machine);
        let (status, info) = self.gateway.check_status(&endpoint).await;
        let now = Utc::now();

        let (machine_status, last_seen) = match status {
            DeviceStatus::Online => (MachineStatus::Online, Some(now)),
            DeviceStatus::Offline => (MachineStatus::Offline, None),
        };
        self.machines
            .update_status(&machine.machine_id, machine_status, last_seen)
            .await?;
        if let Some(info) = &info {
            let users = i32::try_from(info.user_count).unwrap_or(i32::MAX);
            if let Err(e) = self
                .machines
                .update_counters(&machine.machine_id, Some(users), None)
                .await
            {
                warn!(machine_id = %machine.machine_id, error = %e, "Failed to cache device counters");
            }
        }

        info!(machine_id = %machine.machine_id, status = ?status, "Connection test finished");
        Ok(ConnectionTest {
            machine_id: machine.machine_id,
            status,
            info,
            checked_at: now,
        })
    }

    /// Probes an address range for terminals.
    pub async fn scan(&self, request: ScanRequest) -> Result<Vec<ScanHit>, AppError> {
        let targets = expand_targets(&request.prefix, request.start, request.end, &request.ports)?;
        Ok(self.gateway.scan(targets).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clubhouse_core::config::DeviceConfig;
    use clubhouse_core::error::ErrorKind;
    use clubhouse_database::Stores;
    use clubhouse_device::{DeviceEndpoint, MockDeviceConnector, MockTerminal};

    fn service(mock: &MockDeviceConnector) -> MachineService {
        let stores = Stores::memory();
        MachineService::new(
            stores.machines,
            stores.attendance,
            stores.staff,
            DeviceGateway::new(Arc::new(mock.clone()), &DeviceConfig::default()),
        )
    }

    fn input(machine_id: &str, ip: &str) -> CreateMachine {
        CreateMachine {
            machine_id: machine_id.to_string(),
            name: "Front desk".to_string(),
            ip_address: ip.to_string(),
            port: None,
            location: Some("Lobby".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_blank_fields() {
        let svc = service(&MockDeviceConnector::new());
        let created = svc.create(input("M1", "10.0.0.1")).await.unwrap();
        assert_eq!(created.port, 4370);
        assert_eq!(created.status, MachineStatus::Unknown);

        let dup = svc.create(input("M1", "10.0.0.2")).await.unwrap_err();
        assert_eq!(dup.kind, ErrorKind::Conflict);

        let blank = svc.create(input("M2", " ")).await.unwrap_err();
        assert_eq!(blank.kind, ErrorKind::Validation);

        let mut zero = input("M3", "10.0.0.3");
        zero.port = Some(0);
        assert_eq!(svc.create(zero).await.unwrap_err().kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_connection_updates_status() {
        let mock = MockDeviceConnector::new();
        mock.add_terminal(DeviceEndpoint::new("10.0.0.1", 4370), MockTerminal::default());
        let svc = service(&mock);
        let up = svc.create(input("UP", "10.0.0.1")).await.unwrap();
        let down = svc.create(input("DOWN", "10.0.0.99")).await.unwrap();

        let result = svc.test_connection(up.id).await.unwrap();
        assert_eq!(result.status, DeviceStatus::Online);
        assert!(result.info.is_some());
        let detail = svc.get(up.id).await.unwrap();
        assert_eq!(detail.machine.status, MachineStatus::Online);
        assert!(detail.machine.last_seen_at.is_some());

        let result = svc.test_connection(down.id).await.unwrap();
        assert_eq!(result.status, DeviceStatus::Offline);
        assert_eq!(svc.get(down.id).await.unwrap().machine.status, MachineStatus::Offline);
    }

    #[tokio::test]
    async fn test_delete_hides_machine_from_default_list() {
        let svc = service(&MockDeviceConnector::new());
        let m = svc.create(input("M1", "10.0.0.1")).await.unwrap();
        svc.delete(m.id).await.unwrap();
        assert!(svc.list(false).await.unwrap().is_empty());
        assert_eq!(svc.list(true).await.unwrap().len(), 1);
        assert_eq!(svc.delete(Uuid::new_v4()).await.unwrap_err().kind, ErrorKind::NotFound);
    }
}
