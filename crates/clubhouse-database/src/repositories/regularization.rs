//! Regularization request repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_core::result::AppResult;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::regularization::RegularizationRequest;

use crate::store::regularization::{RegularizationFilter, RegularizationStore, Resolution};

/// Repository for regularization requests.
#[derive(Debug, Clone)]
pub struct RegularizationRepository {
    pool: PgPool,
}

impl RegularizationRepository {
    /// Create a new regularization repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegularizationStore for RegularizationRepository {
    async fn create(&self, request: &RegularizationRequest) -> AppResult<RegularizationRequest> {
        sqlx::query_as::<_, RegularizationRequest>(
            "INSERT INTO regularization_requests (id, attendance_log_id, requested_by, requested_by_name, \
             request_type, original_data, requested_data, reason, status, approved_by, approved_by_name, \
             approval_reason, approved_at, notification_sent, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $15) RETURNING *",
        )
        .bind(request.id)
        .bind(request.attendance_log_id)
        .bind(request.requested_by)
        .bind(&request.requested_by_name)
        .bind(request.request_type)
        .bind(&request.original_data)
        .bind(&request.requested_data)
        .bind(&request.reason)
        .bind(request.status)
        .bind(request.approved_by)
        .bind(&request.approved_by_name)
        .bind(&request.approval_reason)
        .bind(request.approved_at)
        .bind(request.notification_sent)
        .bind(request.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create regularization request", e))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<RegularizationRequest>> {
        sqlx::query_as::<_, RegularizationRequest>("SELECT * FROM regularization_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find regularization request", e))
    }

    async fn list(
        &self,
        filter: &RegularizationFilter,
        page: &PageRequest,
    ) -> AppResult<PageResponse<RegularizationRequest>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM regularization_requests \
             WHERE ($1::uuid IS NULL OR requested_by = $1) \
             AND ($2::regularization_status IS NULL OR status = $2)",
        )
        .bind(filter.requested_by)
        .bind(filter.status)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count regularization requests", e))?;

        let items = sqlx::query_as::<_, RegularizationRequest>(
            "SELECT * FROM regularization_requests \
             WHERE ($1::uuid IS NULL OR requested_by = $1) \
             AND ($2::regularization_status IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(filter.requested_by)
        .bind(filter.status)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list regularization requests", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn history(&self, attendance_log_id: Uuid) -> AppResult<Vec<RegularizationRequest>> {
        sqlx::query_as::<_, RegularizationRequest>(
            "SELECT * FROM regularization_requests WHERE attendance_log_id = $1 ORDER BY created_at DESC",
        )
        .bind(attendance_log_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load regularization history", e))
    }

    async fn resolve(
        &self,
        id: Uuid,
        resolution: &Resolution,
    ) -> AppResult<Option<RegularizationRequest>> {
        sqlx::query_as::<_, RegularizationRequest>(
            "UPDATE regularization_requests SET status = $2, approved_by = $3, approved_by_name = $4, \
             approval_reason = $5, approved_at = $6, updated_at = NOW() \
             WHERE id = $1 AND status = 'pending' RETURNING *",
        )
        .bind(id)
        .bind(resolution.status)
        .bind(resolution.approved_by)
        .bind(&resolution.approved_by_name)
        .bind(&resolution.approval_reason)
        .bind(resolution.approved_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to resolve regularization request", e))
    }
}
