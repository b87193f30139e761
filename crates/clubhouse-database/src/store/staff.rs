//! Staff store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use clubhouse_core::error::AppError;
use clubhouse_entity::staff::Staff;

/// Persistence of staff records and their biometric assignment.
#[async_trait]
pub trait StaffStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, staff: &Staff) -> Result<Staff, AppError>;

    async fn find_by_staff_id(&self, staff_id: &str) -> Result<Option<Staff>, AppError>;

    /// Find the staff holding a terminal-local id on a machine.
    async fn find_by_device_user(
        &self,
        machine_id: &str,
        device_user_id: &str,
    ) -> Result<Option<Staff>, AppError>;

    /// Bulk variant of [`StaffStore::find_by_device_user`].
    async fn find_by_device_users(
        &self,
        machine_id: &str,
        device_user_ids: &[String],
    ) -> Result<Vec<Staff>, AppError>;

    /// Bind a staff member to a terminal-local id. Conflict when the id is
    /// already held on that machine, AlreadyAssigned when the staff member is
    /// bound to a different machine.
    async fn set_assignment(
        &self,
        staff_id: &str,
        machine_id: &str,
        device_user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> Result<Staff, AppError>;

    /// Clear the biometric fields.
    async fn clear_assignment(&self, staff_id: &str) -> Result<Option<Staff>, AppError>;

    async fn find_assigned_to(&self, machine_id: &str) -> Result<Vec<Staff>, AppError>;

    async fn count_assigned(&self, machine_id: &str) -> Result<u64, AppError>;
}
