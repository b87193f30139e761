//! Notification store trait.

use async_trait::async_trait;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::notification::{Notification, NotificationType};

/// Persistence of per-recipient notifications.
///
/// Listing and unread counts never include notifications whose
/// `action_taken` flag is set.
#[async_trait]
pub trait NotificationStore: Send + Sync + std::fmt::Debug {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError>;

    /// Page through a recipient's visible notifications, newest first.
    async fn find_for_user(
        &self,
        target_user: Uuid,
        is_read: Option<bool>,
        page: &PageRequest,
    ) -> Result<PageResponse<Notification>, AppError>;

    async fn count_unread(&self, target_user: Uuid) -> Result<u64, AppError>;

    /// Set read and action-taken on one owned notification. Returns `false`
    /// when no such notification belongs to the user.
    async fn mark_read(&self, id: Uuid, target_user: Uuid) -> Result<bool, AppError>;

    /// Set the read flag on every visible notification of the user.
    async fn mark_all_read(&self, target_user: Uuid) -> Result<u64, AppError>;

    /// Hard-delete one owned notification.
    async fn delete(&self, id: Uuid, target_user: Uuid) -> Result<bool, AppError>;

    /// Set read and action-taken on every notification of a type attached
    /// to a regularization request.
    async fn mark_action_taken_for_regularization(
        &self,
        regularization_id: Uuid,
        notification_type: NotificationType,
    ) -> Result<u64, AppError>;
}
