//! Staff repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_core::result::AppResult;
use clubhouse_entity::staff::Staff;

use super::is_unique_violation;
use crate::store::staff::StaffStore;

/// Repository for staff records and biometric assignments.
#[derive(Debug, Clone)]
pub struct StaffRepository {
    pool: PgPool,
}

impl StaffRepository {
    /// Create a new staff repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StaffStore for StaffRepository {
    async fn create(&self, staff: &Staff) -> AppResult<Staff> {
        sqlx::query_as::<_, Staff>(
            "INSERT INTO staff (id, staff_id, name, is_active, biometric_device_id, \
             biometric_device_user_id, biometric_registered_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING *",
        )
        .bind(staff.id)
        .bind(&staff.staff_id)
        .bind(&staff.name)
        .bind(staff.is_active)
        .bind(&staff.biometric_device_id)
        .bind(&staff.biometric_device_user_id)
        .bind(staff.biometric_registered_at)
        .bind(staff.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!("Staff '{}' already exists", staff.staff_id))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to create staff", e)
            }
        })
    }

    async fn find_by_staff_id(&self, staff_id: &str) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE staff_id = $1")
            .bind(staff_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find staff", e))
    }

    async fn find_by_device_user(
        &self,
        machine_id: &str,
        device_user_id: &str,
    ) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE biometric_device_id = $1 AND biometric_device_user_id = $2",
        )
        .bind(machine_id)
        .bind(device_user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve device user", e))
    }

    async fn find_by_device_users(
        &self,
        machine_id: &str,
        device_user_ids: &[String],
    ) -> AppResult<Vec<Staff>> {
        if device_user_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE biometric_device_id = $1 AND biometric_device_user_id = ANY($2)",
        )
        .bind(machine_id)
        .bind(device_user_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve device users", e))
    }

    async fn set_assignment(
        &self,
        staff_id: &str,
        machine_id: &str,
        device_user_id: &str,
        registered_at: DateTime<Utc>,
    ) -> AppResult<Staff> {
        let updated = sqlx::query_as::<_, Staff>(
            "UPDATE staff SET biometric_device_id = $2, biometric_device_user_id = $3, \
             biometric_registered_at = $4, updated_at = NOW() WHERE staff_id = $1 \
             AND (biometric_device_id IS NULL OR biometric_device_id = $2) RETURNING *",
        )
        .bind(staff_id)
        .bind(machine_id)
        .bind(device_user_id)
        .bind(registered_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict(format!(
                    "Device user id {device_user_id} is already in use on machine {machine_id}"
                ))
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to save biometric assignment", e)
            }
        })?;
        if let Some(staff) = updated {
            return Ok(staff);
        }
        match self.find_by_staff_id(staff_id).await? {
            Some(staff) => Err(AppError::already_assigned(format!(
                "Staff '{staff_id}' is already assigned to machine '{}'",
                staff.biometric_device_id.unwrap_or_default()
            ))),
            None => Err(AppError::not_found(format!("Staff {staff_id} not found"))),
        }
    }

    async fn clear_assignment(&self, staff_id: &str) -> AppResult<Option<Staff>> {
        sqlx::query_as::<_, Staff>(
            "UPDATE staff SET biometric_device_id = NULL, biometric_device_user_id = NULL, \
             biometric_registered_at = NULL, updated_at = NOW() WHERE staff_id = $1 RETURNING *",
        )
        .bind(staff_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to clear biometric assignment", e))
    }

    async fn find_assigned_to(&self, machine_id: &str) -> AppResult<Vec<Staff>> {
        sqlx::query_as::<_, Staff>(
            "SELECT * FROM staff WHERE biometric_device_id = $1 ORDER BY staff_id",
        )
        .bind(machine_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list assigned staff", e))
    }

    async fn count_assigned(&self, machine_id: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM staff WHERE biometric_device_id = $1")
            .bind(machine_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count assigned staff", e))?;
        Ok(count as u64)
    }
}
