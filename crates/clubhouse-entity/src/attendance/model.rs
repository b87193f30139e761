//! Attendance log entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{PunchStatus, PunchType, VerifyMethod};

/// One physical punch event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttendanceLog {
    /// Globally unique log identifier (UUID v7).
    pub log_id: Uuid,
    /// Canonical staff identifier.
    pub staff_id: String,
    /// Operator-assigned machine identifier.
    pub machine_id: String,
    /// Staff name at the time of the punch.
    pub staff_name_snapshot: String,
    /// Punch instant (UTC).
    pub timestamp: DateTime<Utc>,
    pub punch_type: PunchType,
    pub method: VerifyMethod,
    /// Machine location at the time of the punch.
    pub location_snapshot: Option<String>,
    /// Machine IP at the time of the punch.
    pub ip_snapshot: Option<String>,
    pub status: PunchStatus,
    pub remarks: Option<String>,
    /// The record as delivered by the terminal or import row.
    pub raw_device_data: Option<serde_json::Value>,
    /// Terminal-local user id, part of the dedup key.
    pub device_user_id: Option<String>,
    /// Terminal record serial, part of the dedup key.
    pub user_sn: Option<i32>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AttendanceLog {
    /// The dedup key of this log, when it carries terminal identifiers.
    pub fn dedup_key(&self) -> Option<DedupKey> {
        match (&self.device_user_id, self.user_sn) {
            (Some(device_user_id), Some(user_sn)) => Some(DedupKey {
                machine_id: self.machine_id.clone(),
                timestamp: self.timestamp,
                device_user_id: device_user_id.clone(),
                user_sn,
            }),
            _ => None,
        }
    }
}

/// Identity of a physical punch across re-syncs and re-imports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DedupKey {
    pub machine_id: String,
    pub timestamp: DateTime<Utc>,
    pub device_user_id: String,
    pub user_sn: i32,
}
