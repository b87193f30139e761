//! Machine repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_core::result::AppResult;
use clubhouse_entity::machine::{Machine, MachineStatus};

use super::is_unique_violation;
use crate::store::machine::MachineStore;

/// Repository for registered terminals.
#[derive(Debug, Clone)]
pub struct MachineRepository {
    pool: PgPool,
}

impl MachineRepository {
    /// Create a new machine repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MachineStore for MachineRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Machine>> {
        sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find machine", e))
    }

    async fn find_by_machine_id(&self, machine_id: &str) -> AppResult<Option<Machine>> {
        sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE machine_id = $1")
            .bind(machine_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find machine", e))
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<Machine>> {
        sqlx::query_as::<_, Machine>(
            "SELECT * FROM machines WHERE ($1 OR is_active) ORDER BY machine_id",
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list machines", e))
    }

    async fn create(&self, machine: &Machine) -> AppResult<Machine> {
        sqlx::query_as::<_, Machine>(
            "INSERT INTO machines (id, machine_id, name, ip_address, port, location, status, \
             last_seen_at, is_active, total_users, total_logs, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) RETURNING *",
        )
        .bind(machine.id)
        .bind(&machine.machine_id)
        .bind(&machine.name)
        .bind(&machine.ip_address)
        .bind(machine.port)
        .bind(&machine.location)
        .bind(machine.status)
        .bind(machine.last_seen_at)
        .bind(machine.is_active)
        .bind(machine.total_users)
        .bind(machine.total_logs)
        .bind(machine.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("Machine '{}' already exists", machine.machine_id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create machine", e)
            }
        })
    }

    async fn update(&self, machine: &Machine) -> AppResult<Machine> {
        sqlx::query_as::<_, Machine>(
            "UPDATE machines SET name = $2, ip_address = $3, port = $4, location = $5, \
             is_active = $6, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(machine.id)
        .bind(&machine.name)
        .bind(&machine.ip_address)
        .bind(machine.port)
        .bind(&machine.location)
        .bind(machine.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update machine", e))?
        .ok_or_else(|| AppError::not_found(format!("Machine {} not found", machine.id)))
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE machines SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete machine", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_status(
        &self,
        machine_id: &str,
        status: MachineStatus,
        last_seen_at: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE machines SET status = $2, last_seen_at = COALESCE($3, last_seen_at), \
             updated_at = NOW() WHERE machine_id = $1",
        )
        .bind(machine_id)
        .bind(status)
        .bind(last_seen_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update machine status", e))?;
        Ok(())
    }

    async fn update_counters(
        &self,
        machine_id: &str,
        total_users: Option<i32>,
        total_logs: Option<i32>,
    ) -> AppResult<()> {
        sqlx::query(
            "UPDATE machines SET total_users = COALESCE($2, total_users), \
             total_logs = COALESCE($3, total_logs), updated_at = NOW() WHERE machine_id = $1",
        )
        .bind(machine_id)
        .bind(total_users)
        .bind(total_logs)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update machine counters", e))?;
        Ok(())
    }
}
