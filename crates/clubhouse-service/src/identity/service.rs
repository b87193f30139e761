//! Staff-to-terminal assignment and device user resolution.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_database::store::{MachineStore, StaffStore};
use clubhouse_device::{DeviceError, DeviceGateway};
use clubhouse_entity::machine::{Machine, MachineStatus};
use clubhouse_entity::staff::Staff;

use crate::machine::{endpoint_of, find_active_machine};

/// Staff fields echoed in sync and import reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub staff_id: String,
    pub name: String,
}

impl From<&Staff> for StaffSummary {
    fn from(staff: &Staff) -> Self {
        Self {
            staff_id: staff.staff_id.clone(),
            name: staff.name.clone(),
        }
    }
}

/// Outcome of a successful assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentResult {
    pub staff_id: String,
    pub machine_id: String,
    pub device_user_id: String,
    pub registered_at: Option<DateTime<Utc>>,
    /// The staff member was already bound to this machine; nothing changed.
    pub already_assigned: bool,
}

/// Outcome of an unassignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnassignResult {
    pub staff_id: String,
    pub machine_id: String,
    pub device_user_id: Option<String>,
    pub device_removed: bool,
    pub device_error: Option<String>,
}

/// One staff entry of a bulk provisioning run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionEntry {
    pub staff_id: String,
    pub device_user_id: String,
    pub success: bool,
    pub error: Option<String>,
}

/// Result of re-provisioning every staff member of a machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkProvisionReport {
    pub machine_id: String,
    pub total: usize,
    pub provisioned: usize,
    pub failed: usize,
    pub results: Vec<ProvisionEntry>,
}

/// Derive the terminal-local id for a staff id.
///
/// Digits of `staff_id` with leading zeros removed; when nothing is left a
/// four-digit suffix derived from `now`. Terminal uids are 16-bit.
pub fn derive_device_user_id(staff_id: &str, now: DateTime<Utc>) -> Result<u16, AppError> {
    let digits: String = staff_id.chars().filter(char::is_ascii_digit).collect();
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        let suffix = now.timestamp_millis().rem_euclid(9000) + 1000;
        return u16::try_from(suffix)
            .map_err(|_| AppError::internal("Derived device user id out of range"));
    }
    trimmed
        .parse::<u16>()
        .ok()
        .filter(|uid| *uid != 0)
        .ok_or_else(|| {
            AppError::validation(format!(
                "Staff id '{staff_id}' yields device user id {trimmed}, above the terminal limit of 65535"
            ))
        })
}

fn provisioning_failed(machine_id: &str, err: DeviceError) -> AppError {
    let mapped = AppError::from(err);
    AppError::new(
        mapped.kind,
        format!("Provisioning failed on machine '{machine_id}': {}", mapped.message),
    )
}

/// Owns the persisted staff-to-terminal assignment.
#[derive(Debug, Clone)]
pub struct IdentityService {
    staff: Arc<dyn StaffStore>,
    machines: Arc<dyn MachineStore>,
    gateway: DeviceGateway,
}

impl IdentityService {
    /// Creates a new identity service.
    pub fn new(
        staff: Arc<dyn StaffStore>,
        machines: Arc<dyn MachineStore>,
        gateway: DeviceGateway,
    ) -> Self {
        Self {
            staff,
            machines,
            gateway,
        }
    }

    async fn find_active_staff(&self, staff_id: &str) -> Result<Staff, AppError> {
        self.staff
            .find_by_staff_id(staff_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::not_found(format!("Staff '{staff_id}' not found or inactive")))
    }

    async fn record_reachability(&self, machine: &Machine, reachable: bool) {
        let (status, seen) = if reachable {
            (MachineStatus::Online, Some(Utc::now()))
        } else {
            (MachineStatus::Offline, None)
        };
        if let Err(e) = self.machines.update_status(&machine.machine_id, status, seen).await {
            warn!(machine_id = %machine.machine_id, error = %e, "Failed to record machine status");
        }
    }

    /// Bind a staff member to a machine and enroll them on the terminal.
    ///
    /// The mapping is persisted only after the terminal accepted the user.
    pub async fn assign(&self, staff_id: &str, machine_id: &str) -> Result<AssignmentResult, AppError> {
        let staff = self.find_active_staff(staff_id).await?;
        let machine = find_active_machine(self.machines.as_ref(), machine_id).await?;

        if staff.is_assigned_to(machine_id) {
            return Ok(AssignmentResult {
                staff_id: staff.staff_id,
                machine_id: machine.machine_id,
                device_user_id: staff.biometric_device_user_id.unwrap_or_default(),
                registered_at: staff.biometric_registered_at,
                already_assigned: true,
            });
        }
        if let Some(current) = &staff.biometric_device_id {
            return Err(AppError::already_assigned(format!(
                "Staff '{staff_id}' is already assigned to machine '{current}'"
            )));
        }

        let now = Utc::now();
        let uid = derive_device_user_id(&staff.staff_id, now)?;
        let device_user_id = uid.to_string();
        if let Some(holder) = self.staff.find_by_device_user(machine_id, &device_user_id).await? {
            if holder.staff_id != staff.staff_id {
                return Err(AppError::conflict(format!(
                    "Device user id {device_user_id} on machine '{machine_id}' is held by staff '{}'",
                    holder.staff_id
                )));
            }
        }

        let endpoint = endpoint_of(&self.gateway, &machine);
        if let Err(e) = self
            .gateway
            .provision_user(&endpoint, uid, &device_user_id, &staff.name)
            .await
        {
            self.record_reachability(&machine, !e.is_unreachable()).await;
            return Err(provisioning_failed(machine_id, e));
        }
        self.record_reachability(&machine, true).await;

        let updated = match self
            .staff
            .set_assignment(&staff.staff_id, machine_id, &device_user_id, now)
            .await
        {
            Ok(updated) => updated,
            Err(e) if e.kind == ErrorKind::AlreadyAssigned => {
                if let Err(cleanup) = self.gateway.deprovision_user(&endpoint, uid).await {
                    warn!(
                        staff_id = %staff.staff_id,
                        machine_id = %machine_id,
                        error = %cleanup,
                        "Failed to remove user enrolled by a lost assignment"
                    );
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        info!(
            staff_id = %updated.staff_id,
            machine_id = %machine_id,
            device_user_id = %device_user_id,
            "Staff assigned to machine"
        );

        Ok(AssignmentResult {
            staff_id: updated.staff_id,
            machine_id: machine.machine_id,
            device_user_id,
            registered_at: updated.biometric_registered_at,
            already_assigned: false,
        })
    }

    /// Remove a staff member from their machine.
    ///
    /// Removal from the terminal is best-effort; the mapping is always cleared.
    pub async fn unassign(&self, staff_id: &str) -> Result<UnassignResult, AppError> {
        let staff = self
            .staff
            .find_by_staff_id(staff_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Staff '{staff_id}' not found")))?;
        let Some(machine_id) = staff.biometric_device_id.clone() else {
            return Err(AppError::validation(format!(
                "Staff '{staff_id}' is not assigned to a machine"
            )));
        };
        let device_user_id = staff.biometric_device_user_id.clone();

        let device_error = match self.machines.find_by_machine_id(&machine_id).await? {
            Some(machine) if machine.is_active => {
                match device_user_id.as_deref().map(str::parse::<u16>) {
                    Some(Ok(uid)) => {
                        let endpoint = endpoint_of(&self.gateway, &machine);
                        match self.gateway.deprovision_user(&endpoint, uid).await {
                            Ok(()) => None,
                            Err(e) => Some(e.to_string()),
                        }
                    }
                    _ => Some("Stored device user id is not a terminal uid".to_string()),
                }
            }
            _ => Some(format!("Machine '{machine_id}' not found or inactive")),
        };
        if let Some(error) = &device_error {
            warn!(staff_id = %staff_id, machine_id = %machine_id, error = %error, "Device removal skipped");
        }

        self.staff.clear_assignment(staff_id).await?;
        info!(staff_id = %staff_id, machine_id = %machine_id, "Staff unassigned");

        Ok(UnassignResult {
            staff_id: staff.staff_id,
            machine_id,
            device_user_id,
            device_removed: device_error.is_none(),
            device_error,
        })
    }

    /// The staff member holding `device_user_id` on `machine_id`, if any.
    pub async fn resolve(&self, machine_id: &str, device_user_id: &str) -> Result<Option<Staff>, AppError> {
        self.staff.find_by_device_user(machine_id, device_user_id).await
    }

    /// Bulk variant of [`IdentityService::resolve`]; unmatched ids are absent.
    pub async fn resolve_many(
        &self,
        machine_id: &str,
        device_user_ids: &[String],
    ) -> Result<HashMap<String, Staff>, AppError> {
        if device_user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let found = self.staff.find_by_device_users(machine_id, device_user_ids).await?;
        Ok(found
            .into_iter()
            .filter_map(|s| s.biometric_device_user_id.clone().map(|id| (id, s)))
            .collect())
    }

    /// Re-enroll every staff member assigned to a machine in one session.
    pub async fn sync_to_machine(&self, machine_id: &str) -> Result<BulkProvisionReport, AppError> {
        let machine = find_active_machine(self.machines.as_ref(), machine_id).await?;
        let assigned = self.staff.find_assigned_to(machine_id).await?;

        let mut results = Vec::with_capacity(assigned.len());
        let mut batch = Vec::with_capacity(assigned.len());
        let mut owners = HashMap::new();
        for staff in &assigned {
            let device_user_id = staff.biometric_device_user_id.clone().unwrap_or_default();
            match device_user_id.parse::<u16>() {
                Ok(uid) => {
                    owners.insert(device_user_id.clone(), staff.staff_id.clone());
                    batch.push((uid, device_user_id, staff.name.clone()));
                }
                Err(_) => results.push(ProvisionEntry {
                    staff_id: staff.staff_id.clone(),
                    device_user_id,
                    success: false,
                    error: Some("Stored device user id is not a terminal uid".to_string()),
                }),
            }
        }

        if !batch.is_empty() {
            let endpoint = endpoint_of(&self.gateway, &machine);
            let outcomes = self.gateway.provision_users(&endpoint, &batch).await;
            let reachable = outcomes
                .iter()
                .any(|o| o.result.as_ref().err().is_none_or(|e| !e.is_unreachable()));
            self.record_reachability(&machine, reachable).await;

            for outcome in outcomes {
                results.push(ProvisionEntry {
                    staff_id: owners.get(&outcome.device_user_id).cloned().unwrap_or_default(),
                    device_user_id: outcome.device_user_id,
                    success: outcome.result.is_ok(),
                    error: outcome.result.err().map(|e| e.to_string()),
                });
            }
        }

        let provisioned = results.iter().filter(|r| r.success).count();
        info!(
            machine_id = %machine_id,
            total = results.len(),
            provisioned,
            "Staff synced to machine"
        );
        Ok(BulkProvisionReport {
            machine_id: machine.machine_id,
            total: results.len(),
            provisioned,
            failed: results.len() - provisioned,
            results,
        })
    }
}
