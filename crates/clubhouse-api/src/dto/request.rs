//! Request DTOs with validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use clubhouse_database::store::AttendanceFilter;
use clubhouse_entity::attendance::{PunchStatus, PunchType};
use clubhouse_entity::regularization::{RegularizationStatus, RequestType};
use clubhouse_service::attendance::NewAttendanceLog;
use clubhouse_service::machine::{CreateMachine, UpdateMachine};
use clubhouse_service::regularization::NewRegularization;

/// Register machine request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateMachineRequest {
    #[validate(length(min = 1, max = 50, message = "machine_id is required"))]
    pub machine_id: String,
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "ip_address is required"))]
    pub ip_address: String,
    #[validate(range(min = 1, message = "port must be between 1 and 65535"))]
    pub port: Option<u16>,
    pub location: Option<String>,
}

impl From<CreateMachineRequest> for CreateMachine {
    fn from(req: CreateMachineRequest) -> Self {
        Self {
            machine_id: req.machine_id,
            name: req.name,
            ip_address: req.ip_address,
            port: req.port,
            location: req.location,
        }
    }
}

/// Update machine request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateMachineRequest {
    #[validate(length(min = 1, max = 100, message = "name must not be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, message = "ip_address must not be empty"))]
    pub ip_address: Option<String>,
    #[validate(range(min = 1, message = "port must be between 1 and 65535"))]
    pub port: Option<u16>,
    pub location: Option<String>,
    pub is_active: Option<bool>,
}

impl From<UpdateMachineRequest> for UpdateMachine {
    fn from(req: UpdateMachineRequest) -> Self {
        Self {
            name: req.name,
            ip_address: req.ip_address,
            port: req.port,
            location: req.location,
            is_active: req.is_active,
        }
    }
}

/// Query for `GET /biometric/machines`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MachineListQuery {
    #[serde(default)]
    pub include_inactive: bool,
}

/// Query for a network scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanQuery {
    pub prefix: String,
    #[serde(default = "default_scan_start")]
    pub start: u8,
    #[serde(default = "default_scan_end")]
    pub end: u8,
    /// Comma-separated ports; the configured default port when absent.
    pub ports: Option<String>,
}

fn default_scan_start() -> u8 {
    1
}

fn default_scan_end() -> u8 {
    254
}

/// Manual attendance entry body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateLogRequest {
    #[validate(length(min = 1, message = "staff_id is required"))]
    pub staff_id: String,
    #[validate(length(min = 1, message = "machine_id is required"))]
    pub machine_id: String,
    #[validate(length(min = 1, message = "punch_type is required"))]
    pub punch_type: String,
    #[validate(length(min = 1, message = "timestamp is required"))]
    pub timestamp: String,
    pub method: Option<String>,
    pub remarks: Option<String>,
}

impl From<CreateLogRequest> for NewAttendanceLog {
    fn from(req: CreateLogRequest) -> Self {
        Self {
            staff_id: Some(req.staff_id),
            machine_id: Some(req.machine_id),
            punch_type: Some(req.punch_type),
            timestamp: Some(req.timestamp),
            method: req.method,
            remarks: req.remarks,
        }
    }
}

/// Attendance list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceQuery {
    pub machine_id: Option<String>,
    pub staff_id: Option<String>,
    pub punch_type: Option<PunchType>,
    pub status: Option<PunchStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl From<AttendanceQuery> for AttendanceFilter {
    fn from(q: AttendanceQuery) -> Self {
        Self {
            machine_id: q.machine_id,
            staff_id: q.staff_id,
            punch_type: q.punch_type,
            status: q.status,
            from: q.from,
            to: q.to,
        }
    }
}

/// Query for the sample export file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleQuery {
    pub format: Option<String>,
}

/// Staff assignment body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignStaffRequest {
    #[validate(length(min = 1, message = "staff_id is required"))]
    pub staff_id: String,
    #[validate(length(min = 1, message = "machine_id is required"))]
    pub machine_id: String,
}

/// New regularization request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateRegularizationRequest {
    pub attendance_log_id: Uuid,
    pub request_type: RequestType,
    pub original_data: Option<serde_json::Value>,
    pub requested_data: serde_json::Value,
    #[validate(length(min = 1, max = 1000, message = "reason is required"))]
    pub reason: String,
}

impl From<CreateRegularizationRequest> for NewRegularization {
    fn from(req: CreateRegularizationRequest) -> Self {
        Self {
            attendance_log_id: req.attendance_log_id,
            request_type: req.request_type,
            original_data: req.original_data,
            requested_data: req.requested_data,
            reason: req.reason,
        }
    }
}

/// Approve or reject body.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResolveRequest {
    #[validate(length(max = 1000, message = "approval_reason is too long"))]
    pub approval_reason: Option<String>,
}

/// Regularization list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegularizationQuery {
    pub status: Option<RegularizationStatus>,
}

/// Notification list filters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationQuery {
    pub is_read: Option<bool>,
}
