//! In-memory machine store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_entity::machine::{Machine, MachineStatus};

use crate::store::machine::MachineStore;

/// Registered terminals held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryMachineStore {
    machines: Arc<RwLock<HashMap<Uuid, Machine>>>,
}

impl MemoryMachineStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MachineStore for MemoryMachineStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Machine>, AppError> {
        Ok(self.machines.read().await.get(&id).cloned())
    }

    async fn find_by_machine_id(&self, machine_id: &str) -> Result<Option<Machine>, AppError> {
        Ok(self
            .machines
            .read()
            .await
            .values()
            .find(|m| m.machine_id == machine_id)
            .cloned())
    }

    async fn list(&self, include_inactive: bool) -> Result<Vec<Machine>, AppError> {
        let mut machines: Vec<Machine> = self
            .machines
            .read()
            .await
            .values()
            .filter(|m| include_inactive || m.is_active)
            .cloned()
            .collect();
        machines.sort_by(|a, b| a.machine_id.cmp(&b.machine_id));
        Ok(machines)
    }

    async fn create(&self, machine: &Machine) -> Result<Machine, AppError> {
        let mut machines = self.machines.write().await;
        if machines.values().any(|m| m.machine_id == machine.machine_id) {
            return Err(AppError::conflict(format!(
                "Machine '{}' already exists",
                machine.machine_id
            )));
        }
        machines.insert(machine.id, machine.clone());
        Ok(machine.clone())
    }

    async fn update(&self, machine: &Machine) -> Result<Machine, AppError> {
        let mut machines = self.machines.write().await;
        let existing = machines
            .get_mut(&machine.id)
            .ok_or_else(|| AppError::not_found(format!("Machine {} not found", machine.id)))?;
        existing.name = machine.name.clone();
        existing.ip_address = machine.ip_address.clone();
        existing.port = machine.port;
        existing.location = machine.location.clone();
        existing.is_active = machine.is_active;
        existing.updated_at = Utc::now();
        Ok(existing.clone())
    }

    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut machines = self.machines.write().await;
        match machines.get_mut(&id) {
            Some(m) if m.is_active => {
                m.is_active = false;
                m.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn update_status(
        &self,
        machine_id: &str,
        status: MachineStatus,
        last_seen_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError> {
        let mut machines = self.machines.write().await;
        if let Some(m) = machines.values_mut().find(|m| m.machine_id == machine_id) {
            m.status = status;
            if last_seen_at.is_some() {
                m.last_seen_at = last_seen_at;
            }
            m.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_counters(
        &self,
        machine_id: &str,
        total_users: Option<i32>,
        total_logs: Option<i32>,
    ) -> Result<(), AppError> {
        let mut machines = self.machines.write().await;
        if let Some(m) = machines.values_mut().find(|m| m.machine_id == machine_id) {
            if let Some(users) = total_users {
                m.total_users = users;
            }
            if let Some(logs) = total_logs {
                m.total_logs = logs;
            }
            m.updated_at = Utc::now();
        }
        Ok(())
    }
}
