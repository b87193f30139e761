//! Manual attendance entry, queries and statistics.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_database::store::{AttendanceFilter, AttendanceLogStore, CountBucket, MachineStore, StaffStore};
use clubhouse_entity::attendance::{AttendanceLog, PunchStatus, PunchType, VerifyMethod};

use super::timestamp::TimestampParser;
use crate::machine::find_active_machine;

/// A manually entered punch.
///
/// Also the payload of an `add_log` regularization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewAttendanceLog {
    pub staff_id: Option<String>,
    pub machine_id: Option<String>,
    pub punch_type: Option<String>,
    pub timestamp: Option<String>,
    pub method: Option<String>,
    pub remarks: Option<String>,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str, AppError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

/// Log count for one machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineCount {
    pub machine_id: String,
    pub machine_name: Option<String>,
    pub count: u64,
}

/// Grouped totals over attendance logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total: u64,
    pub by_punch_type: Vec<CountBucket>,
    pub by_method: Vec<CountBucket>,
    pub by_machine: Vec<MachineCount>,
}

/// Manual entry and read access to attendance logs.
#[derive(Debug, Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceLogStore>,
    machines: Arc<dyn MachineStore>,
    staff: Arc<dyn StaffStore>,
    timestamps: TimestampParser,
}

impl AttendanceService {
    /// Creates a new attendance service.
    pub fn new(
        attendance: Arc<dyn AttendanceLogStore>,
        machines: Arc<dyn MachineStore>,
        staff: Arc<dyn StaffStore>,
        timestamps: TimestampParser,
    ) -> Self {
        Self {
            attendance,
            machines,
            staff,
            timestamps,
        }
    }

    /// Record a punch entered by hand.
    pub async fn create_log(&self, input: &NewAttendanceLog) -> Result<AttendanceLog, AppError> {
        let staff_id = required("staff_id", &input.staff_id)?;
        let machine_id = required("machine_id", &input.machine_id)?;
        let punch_type: PunchType = required("punch_type", &input.punch_type)?.parse()?;
        let timestamp = self.timestamps.parse(required("timestamp", &input.timestamp)?)?;
        let method = match input.method.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            Some(m) => m.parse()?,
            None => VerifyMethod::Fingerprint,
        };

        let staff = self
            .staff
            .find_by_staff_id(staff_id)
            .await?
            .filter(|s| s.is_active)
            .ok_or_else(|| AppError::not_found(format!("Staff '{staff_id}' not found or inactive")))?;
        let machine = find_active_machine(self.machines.as_ref(), machine_id).await?;

        let now = Utc::now();
        let log = AttendanceLog {
            log_id: Uuid::now_v7(),
            staff_id: staff.staff_id,
            machine_id: machine.machine_id,
            staff_name_snapshot: staff.name,
            timestamp,
            punch_type,
            method,
            location_snapshot: machine.location,
            ip_snapshot: Some(machine.ip_address),
            status: PunchStatus::Success,
            remarks: input.remarks.clone(),
            raw_device_data: None,
            device_user_id: None,
            user_sn: None,
            is_deleted: false,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        let stored = self
            .attendance
            .insert(&log)
            .await?
            .ok_or_else(|| AppError::conflict("An identical attendance log already exists"))?;
        info!(
            log_id = %stored.log_id,
            staff_id = %stored.staff_id,
            machine_id = %stored.machine_id,
            "Manual attendance log created"
        );
        Ok(stored)
    }

    /// Find one live log.
    pub async fn get(&self, log_id: Uuid) -> Result<AttendanceLog, AppError> {
        self.attendance
            .find_by_id(log_id)
            .await?
            .filter(|l| !l.is_deleted)
            .ok_or_else(|| AppError::not_found(format!("Attendance log {log_id} not found")))
    }

    /// Page through logs, newest first.
    pub async fn list(
        &self,
        filter: &AttendanceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AttendanceLog>, AppError> {
        self.attendance.query(filter, page).await
    }

    /// Logs of one machine.
    pub async fn by_machine(
        &self,
        machine_id: &str,
        filter: AttendanceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AttendanceLog>, AppError> {
        let filter = AttendanceFilter {
            machine_id: Some(machine_id.to_string()),
            ..filter
        };
        self.attendance.query(&filter, page).await
    }

    /// Logs of one staff member.
    pub async fn by_staff(
        &self,
        staff_id: &str,
        filter: AttendanceFilter,
        page: &PageRequest,
    ) -> Result<PageResponse<AttendanceLog>, AppError> {
        let filter = AttendanceFilter {
            staff_id: Some(staff_id.to_string()),
            ..filter
        };
        self.attendance.query(&filter, page).await
    }

    /// Totals by punch type, method and machine.
    pub async fn stats(&self, filter: &AttendanceFilter) -> Result<AttendanceStats, AppError> {
        let counts = self.attendance.stats(filter).await?;
        let names: HashMap<String, String> = self
            .machines
            .list(true)
            .await?
            .into_iter()
            .map(|m| (m.machine_id, m.name))
            .collect();

        Ok(AttendanceStats {
            total: counts.total,
            by_punch_type: counts.by_punch_type,
            by_method: counts.by_method,
            by_machine: counts
                .by_machine
                .into_iter()
                .map(|bucket| MachineCount {
                    machine_name: names.get(&bucket.key).cloned(),
                    machine_id: bucket.key,
                    count: bucket.count,
                })
                .collect(),
        })
    }
}
