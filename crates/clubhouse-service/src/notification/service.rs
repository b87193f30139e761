//! Notification listing, read state and delivery.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_database::store::NotificationStore;
use clubhouse_entity::notification::{Notification, NotificationPriority, NotificationType};

use crate::context::RequestContext;

/// A page of visible notifications with the recipient's unread total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPage {
    #[serde(flatten)]
    pub page: PageResponse<Notification>,
    pub unread_count: u64,
}

/// A notification to deliver.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub target_user: Uuid,
    pub priority: NotificationPriority,
    pub regularization_id: Option<Uuid>,
    pub attendance_log_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
    pub requested_by_name: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Manages the caller's notifications.
#[derive(Debug, Clone)]
pub struct NotificationService {
    store: Arc<dyn NotificationStore>,
}

impl NotificationService {
    /// Creates a new notification service.
    pub fn new(store: Arc<dyn NotificationStore>) -> Self {
        Self { store }
    }

    /// Lists the caller's notifications. Action-taken ones are never listed.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        is_read: Option<bool>,
        page: &PageRequest,
    ) -> Result<NotificationPage, AppError> {
        let page = self.store.find_for_user(ctx.user_id, is_read, page).await?;
        let unread_count = self.store.count_unread(ctx.user_id).await?;
        Ok(NotificationPage { page, unread_count })
    }

    /// Gets the unread notification count.
    pub async fn unread_count(&self, ctx: &RequestContext) -> Result<u64, AppError> {
        self.store.count_unread(ctx.user_id).await
    }

    /// Marks one notification read. Reading also clears it from the list.
    pub async fn mark_read(&self, ctx: &RequestContext, id: Uuid) -> Result<(), AppError> {
        if !self.store.mark_read(id, ctx.user_id).await? {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Marks every visible notification of the caller read.
    pub async fn mark_all_read(&self, ctx: &RequestContext) -> Result<u64, AppError> {
        let updated = self.store.mark_all_read(ctx.user_id).await?;
        debug!(user_id = %ctx.user_id, updated, "Marked notifications read");
        Ok(updated)
    }

    /// Deletes one of the caller's notifications.
    pub async fn delete(&self, ctx: &RequestContext, id: Uuid) -> Result<(), AppError> {
        if !self.store.delete(id, ctx.user_id).await? {
            return Err(AppError::not_found(format!("Notification {id} not found")));
        }
        Ok(())
    }

    /// Delivers a notification.
    pub async fn notify(&self, new: NewNotification) -> Result<Notification, AppError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            notification_type: new.notification_type,
            title: new.title,
            message: new.message,
            regularization_id: new.regularization_id,
            attendance_log_id: new.attendance_log_id,
            requested_by: new.requested_by,
            requested_by_name: new.requested_by_name,
            target_user: new.target_user,
            is_read: false,
            read_at: None,
            action_taken: false,
            action_taken_at: None,
            priority: new.priority,
            metadata: new.metadata,
            created_at: Utc::now(),
        };
        let created = self.store.create(&notification).await?;
        info!(
            notification_id = %created.id,
            target_user = %created.target_user,
            kind = %created.notification_type,
            "Notification delivered"
        );
        Ok(created)
    }

    /// Closes every request notification of a regularization.
    pub async fn close_requests(&self, regularization_id: Uuid) -> Result<u64, AppError> {
        self.store
            .mark_action_taken_for_regularization(
                regularization_id,
                NotificationType::RegularizationRequest,
            )
            .await
    }
}
