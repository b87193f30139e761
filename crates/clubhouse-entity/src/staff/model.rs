//! Staff entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A staff member together with their biometric assignment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Staff {
    pub id: Uuid,
    /// Canonical staff identifier (e.g. `EMP0042`).
    pub staff_id: String,
    pub name: String,
    pub is_active: bool,
    /// Operator-assigned machine the staff is enrolled on.
    pub biometric_device_id: Option<String>,
    /// Terminal-local user id on that machine.
    pub biometric_device_user_id: Option<String>,
    pub biometric_registered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Staff {
    /// Whether the staff is assigned to the given machine.
    pub fn is_assigned_to(&self, machine_id: &str) -> bool {
        self.biometric_device_id.as_deref() == Some(machine_id)
    }
}
