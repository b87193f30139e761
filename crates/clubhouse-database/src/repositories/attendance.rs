//! Attendance log repository implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_core::result::AppResult;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::attendance::{AttendanceLog, DedupKey, PunchStatus};

use super::is_unique_violation;
use crate::store::attendance::{AttendanceCounts, AttendanceFilter, AttendanceLogStore, CountBucket};

/// Parameterized WHERE clause shared by listing and statistics. Parameters
/// `$1..$6` are bound by [`bind_filter!`].
const FILTER_CLAUSE: &str = "NOT is_deleted \
     AND ($1::text IS NULL OR machine_id = $1) \
     AND ($2::text IS NULL OR staff_id = $2) \
     AND ($3::punch_type IS NULL OR punch_type = $3) \
     AND ($4::punch_status IS NULL OR status = $4) \
     AND ($5::timestamptz IS NULL OR timestamp >= $5) \
     AND ($6::timestamptz IS NULL OR timestamp <= $6)";

macro_rules! bind_filter {
    ($query:expr, $filter:expr) => {
        $query
            .bind($filter.machine_id.as_deref())
            .bind($filter.staff_id.as_deref())
            .bind($filter.punch_type)
            .bind($filter.status)
            .bind($filter.from)
            .bind($filter.to)
    };
}

/// Repository for attendance logs.
#[derive(Debug, Clone)]
pub struct AttendanceLogRepository {
    pool: PgPool,
}

impl AttendanceLogRepository {
    /// Create a new attendance log repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn grouped(&self, column: &str, filter: &AttendanceFilter) -> AppResult<Vec<CountBucket>> {
        let sql = format!(
            "SELECT {column}::text AS key, COUNT(*) AS count FROM attendance_logs \
             WHERE {FILTER_CLAUSE} GROUP BY {column} ORDER BY count DESC"
        );
        let rows: Vec<(String, i64)> = bind_filter!(sqlx::query_as::<_, (String, i64)>(&sql), filter)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to compute attendance stats", e)
            })?;
        Ok(rows
            .into_iter()
            .map(|(key, count)| CountBucket {
                key,
                count: count as u64,
            })
            .collect())
    }
}

#[async_trait]
impl AttendanceLogStore for AttendanceLogRepository {
    async fn find_by_id(&self, log_id: Uuid) -> AppResult<Option<AttendanceLog>> {
        sqlx::query_as::<_, AttendanceLog>("SELECT * FROM attendance_logs WHERE log_id = $1")
            .bind(log_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find attendance log", e))
    }

    async fn exists(&self, key: &DedupKey) -> AppResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM attendance_logs \
             WHERE machine_id = $1 AND timestamp = $2 AND device_user_id = $3 AND user_sn = $4)",
        )
        .bind(&key.machine_id)
        .bind(key.timestamp)
        .bind(&key.device_user_id)
        .bind(key.user_sn)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to check duplicate punch", e))
    }

    async fn insert(&self, log: &AttendanceLog) -> AppResult<Option<AttendanceLog>> {
        sqlx::query_as::<_, AttendanceLog>(
            "INSERT INTO attendance_logs (log_id, staff_id, machine_id, staff_name_snapshot, timestamp, \
             punch_type, method, location_snapshot, ip_snapshot, status, remarks, raw_device_data, \
             device_user_id, user_sn, is_deleted, deleted_at, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, FALSE, NULL, $15, $15) \
             ON CONFLICT DO NOTHING RETURNING *",
        )
        .bind(log.log_id)
        .bind(&log.staff_id)
        .bind(&log.machine_id)
        .bind(&log.staff_name_snapshot)
        .bind(log.timestamp)
        .bind(log.punch_type)
        .bind(log.method)
        .bind(&log.location_snapshot)
        .bind(&log.ip_snapshot)
        .bind(log.status)
        .bind(&log.remarks)
        .bind(&log.raw_device_data)
        .bind(&log.device_user_id)
        .bind(log.user_sn)
        .bind(log.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert attendance log", e))
    }

    async fn update_timestamp(
        &self,
        log_id: Uuid,
        timestamp: DateTime<Utc>,
    ) -> AppResult<Option<AttendanceLog>> {
        sqlx::query_as::<_, AttendanceLog>(
            "UPDATE attendance_logs SET timestamp = $2, updated_at = NOW() WHERE log_id = $1 RETURNING *",
        )
        .bind(log_id)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::conflict("Another punch already exists at that time")
            } else {
                AppError::with_source(ErrorKind::Database, "Failed to update attendance timestamp", e)
            }
        })
    }

    async fn update_status(
        &self,
        log_id: Uuid,
        status: PunchStatus,
    ) -> AppResult<Option<AttendanceLog>> {
        sqlx::query_as::<_, AttendanceLog>(
            "UPDATE attendance_logs SET status = $2, updated_at = NOW() WHERE log_id = $1 RETURNING *",
        )
        .bind(log_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update attendance status", e))
    }

    async fn soft_delete(&self, log_id: Uuid) -> AppResult<Option<AttendanceLog>> {
        sqlx::query_as::<_, AttendanceLog>(
            "UPDATE attendance_logs SET is_deleted = TRUE, deleted_at = NOW(), updated_at = NOW() \
             WHERE log_id = $1 RETURNING *",
        )
        .bind(log_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete attendance log", e))
    }

    async fn query(
        &self,
        filter: &AttendanceFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<AttendanceLog>> {
        let count_sql = format!("SELECT COUNT(*) FROM attendance_logs WHERE {FILTER_CLAUSE}");
        let total: i64 = bind_filter!(sqlx::query_scalar::<_, i64>(&count_sql), filter)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count attendance logs", e))?;

        let select_sql = format!(
            "SELECT * FROM attendance_logs WHERE {FILTER_CLAUSE} \
             ORDER BY timestamp DESC LIMIT $7 OFFSET $8"
        );
        let logs = bind_filter!(sqlx::query_as::<_, AttendanceLog>(&select_sql), filter)
            .bind(page.limit() as i64)
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list attendance logs", e))?;

        Ok(PageResponse::new(logs, page.page, page.page_size, total as u64))
    }

    async fn stats(&self, filter: &AttendanceFilter) -> AppResult<AttendanceCounts> {
        let by_punch_type = self.grouped("punch_type", filter).await?;
        let by_method = self.grouped("method", filter).await?;
        let by_machine = self.grouped("machine_id", filter).await?;
        let total = by_punch_type.iter().map(|b| b.count).sum();
        Ok(AttendanceCounts {
            total,
            by_punch_type,
            by_method,
            by_machine,
        })
    }

    async fn count_for_machine(&self, machine_id: &str) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM attendance_logs WHERE machine_id = $1 AND NOT is_deleted",
        )
        .bind(machine_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count machine logs", e))?;
        Ok(count as u64)
    }
}
