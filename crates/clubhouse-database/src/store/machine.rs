//! Machine store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_entity::machine::{Machine, MachineStatus};

/// Persistence of registered terminals.
#[async_trait]
pub trait MachineStore: Send + Sync + std::fmt::Debug {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Machine>, AppError>;

    /// Find by the operator-assigned identifier.
    async fn find_by_machine_id(&self, machine_id: &str) -> Result<Option<Machine>, AppError>;

    async fn list(&self, include_inactive: bool) -> Result<Vec<Machine>, AppError>;

    /// Insert a machine. Conflict when `machine_id` is taken.
    async fn create(&self, machine: &Machine) -> Result<Machine, AppError>;

    /// Persist changed attributes of an existing machine.
    async fn update(&self, machine: &Machine) -> Result<Machine, AppError>;

    /// Mark a machine inactive. Returns `false` when absent.
    async fn soft_delete(&self, id: Uuid) -> Result<bool, AppError>;

    /// Record the outcome of a connection attempt.
    async fn update_status(
        &self,
        machine_id: &str,
        status: MachineStatus,
        last_seen_at: Option<DateTime<Utc>>,
    ) -> Result<(), AppError>;

    /// Refresh the cached counters.
    async fn update_counters(
        &self,
        machine_id: &str,
        total_users: Option<i32>,
        total_logs: Option<i32>,
    ) -> Result<(), AppError>;
}
