//! Machine entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::MachineStatus;

/// A registered biometric terminal.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Machine {
    /// Internal identifier.
    pub id: Uuid,
    /// Unique operator-assigned identifier (e.g. `M1`).
    pub machine_id: String,
    /// Display name.
    pub name: String,
    /// Terminal IPv4 address.
    pub ip_address: String,
    /// Terminal TCP port.
    pub port: i32,
    /// Physical location label.
    pub location: Option<String>,
    /// Last observed reachability.
    pub status: MachineStatus,
    /// When the terminal last answered.
    pub last_seen_at: Option<DateTime<Utc>>,
    /// Inactive machines are hidden from ingest and assignment.
    pub is_active: bool,
    /// Cached enrolled staff count.
    pub total_users: i32,
    /// Cached stored log count.
    pub total_logs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Machine {
    /// The terminal TCP port as `u16`, falling back when out of range.
    pub fn port_or(&self, fallback: u16) -> u16 {
        u16::try_from(self.port).ok().filter(|p| *p != 0).unwrap_or(fallback)
    }
}
