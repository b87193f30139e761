//! Notification repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use clubhouse_core::error::{AppError, ErrorKind};
use clubhouse_core::result::AppResult;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::notification::{Notification, NotificationType};

use crate::store::notification::NotificationStore;

/// Repository for notification CRUD operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    /// Create a new notification repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationStore for NotificationRepository {
    async fn create(&self, n: &Notification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications (id, notification_type, title, message, regularization_id, \
             attendance_log_id, requested_by, requested_by_name, target_user, is_read, read_at, \
             action_taken, action_taken_at, priority, metadata, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING *",
        )
        .bind(n.id)
        .bind(n.notification_type)
        .bind(&n.title)
        .bind(&n.message)
        .bind(n.regularization_id)
        .bind(n.attendance_log_id)
        .bind(n.requested_by)
        .bind(&n.requested_by_name)
        .bind(n.target_user)
        .bind(n.is_read)
        .bind(n.read_at)
        .bind(n.action_taken)
        .bind(n.action_taken_at)
        .bind(n.priority)
        .bind(&n.metadata)
        .bind(n.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create notification", e))
    }

    async fn find_for_user(
        &self,
        target_user: Uuid,
        is_read: Option<bool>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE target_user = $1 AND NOT action_taken AND ($2::boolean IS NULL OR is_read = $2)",
        )
        .bind(target_user)
        .bind(is_read)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count notifications", e))?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE target_user = $1 AND NOT action_taken AND ($2::boolean IS NULL OR is_read = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(target_user)
        .bind(is_read)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list notifications", e))?;

        Ok(PageResponse::new(items, page.page, page.page_size, total as u64))
    }

    async fn count_unread(&self, target_user: Uuid) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE target_user = $1 AND NOT is_read AND NOT action_taken",
        )
        .bind(target_user)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count unread", e))?;
        Ok(count as u64)
    }

    async fn mark_read(&self, id: Uuid, target_user: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()), \
             action_taken = TRUE, action_taken_at = COALESCE(action_taken_at, NOW()) \
             WHERE id = $1 AND target_user = $2",
        )
        .bind(id)
        .bind(target_user)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark read", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, target_user: Uuid) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() \
             WHERE target_user = $1 AND NOT is_read AND NOT action_taken",
        )
        .bind(target_user)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to mark all read", e))?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid, target_user: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1 AND target_user = $2")
            .bind(id)
            .bind(target_user)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to delete notification", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_action_taken_for_regularization(
        &self,
        regularization_id: Uuid,
        notification_type: NotificationType,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = COALESCE(read_at, NOW()), \
             action_taken = TRUE, action_taken_at = NOW() \
             WHERE regularization_id = $1 AND notification_type = $2 AND NOT action_taken",
        )
        .bind(regularization_id)
        .bind(notification_type)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to close request notifications", e))?;
        Ok(result.rows_affected())
    }
}
