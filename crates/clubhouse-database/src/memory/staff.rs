//! In-memory staff store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use clubhouse_core::error::AppError;
use clubhouse_entity::staff::Staff;

use crate::store::staff::StaffStore;

/// Staff records keyed by canonical staff id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStaffStore {
    staff: Arc<RwLock<HashMap<String, Staff>>>,
}

impl MemoryStaffStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StaffStore for MemoryStaffStore {
    async fn create(&self, staff: &Staff) -> Result<Staff, AppError> {
        let mut all = self.staff.write().await;
        if all.contains_key(&staff.staff_id) {
            return Err(AppError::conflict(format!("Staff '{}' already exists", staff.staff_id)));
        }
        all.insert(staff.staff_id.clone(), staff.clone());
        Ok(staff.clone())
    }

    async fn find_by_staff_id(&self, staff_id: &str) -> Result<Option<Staff>, AppError> {
        Ok(self.staff.read().await.get(staff_id).cloned())
    }

    async fn find_by_device_user(
        &self,
        machine_id: &str,
        device_user_id: &str,
    ) -> Result<Option<Staff>, AppError> {
        Ok(self
            .staff
            .read()
            .await
            .values()
            .find(|s| {
                s.is_assigned_to(machine_id)
                    && s.biometric_device_user_id.as_deref() == Some(device_user_id)
            })
            .cloned())
    }

    async fn find_by_device_users(
        &self,
        machine_id: &str,
        device_user_ids: &[String],
    ) -> Result<Vec<Staff>, AppError> {
        Ok(self
            .staff
            .read()
            .await
            .values()
            .filter(|s| {
                s.is_assigned_to(machine_id)
                    && s.biometric_device_user_id
                        .as_ref()
                        .is_some_and(|id| device_user_ids.contains(id))
            })
            .cloned()
            .collect())
    }

    async fn set_assignment(
        &self,
        staff_id: &str,
        machine_id: &str,
        device_user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<Staff, AppError> {
        let mut all = self.staff.write().await;
        let taken = all.values().any(|s| {
            s.staff_id != staff_id
                && s.is_assigned_to(machine_id)
                && s.biometric_device_user_id.as_deref() == Some(device_user_id)
        });
        if taken {
            return Err(AppError::conflict(format!(
                "Device user id {device_user_id} is already in use on machine {machine_id}"
            )));
        }
        let staff = all
            .get_mut(staff_id)
            .ok_or_else(|| AppError::not_found(format!("Staff {staff_id} not found")))?;
        if let Some(current) = staff.biometric_device_id.as_deref().filter(|m| *m != machine_id) {
            return Err(AppError::already_assigned(format!(
                "Staff '{staff_id}' is already assigned to machine '{current}'"
            )));
        }
        staff.biometric_device_id = Some(machine_id.to_string());
        staff.biometric_device_user_id = Some(device_user_id.to_string());
        staff.biometric_registered_at = Some(registered_at);
        staff.updated_at = Utc::now();
        Ok(staff.clone())
    }

    async fn clear_assignment(&self, staff_id: &str) -> Result<Option<Staff>, AppError> {
        let mut all = self.staff.write().await;
        Ok(all.get_mut(staff_id).map(|staff| {
            staff.biometric_device_id = None;
            staff.biometric_device_user_id = None;
            staff.biometric_registered_at = None;
            staff.updated_at = Utc::now();
            staff.clone()
        }))
    }

    async fn find_assigned_to(&self, machine_id: &str) -> Result<Vec<Staff>, AppError> {
        let mut assigned: Vec<Staff> = self
            .staff
            .read()
            .await
            .values()
            .filter(|s| s.is_assigned_to(machine_id))
            .cloned()
            .collect();
        assigned.sort_by(|a, b| a.staff_id.cmp(&b.staff_id));
        Ok(assigned)
    }

    async fn count_assigned(&self, machine_id: &str) -> Result<u64, AppError> {
        Ok(self
            .staff
            .read()
            .await
            .values()
            .filter(|s| s.is_assigned_to(machine_id))
            .count() as u64)
    }
}
