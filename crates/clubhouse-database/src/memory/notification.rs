//! In-memory notification store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_entity::notification::{Notification, NotificationType};

use super::paginate;
use crate::store::notification::NotificationStore;

/// Notifications held in process memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotificationStore {
    notifications: Arc<RwLock<HashMap<Uuid, Notification>>>,
}

impl MemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationStore for MemoryNotificationStore {
    async fn create(&self, notification: &Notification) -> Result<Notification, AppError> {
        self.notifications
            .write()
            .await
            .insert(notification.id, notification.clone());
        Ok(notification.clone())
    }

    async fn find_for_user(
        &self,
        target_user: Uuid,
        is_read: Option<bool>,
        page: &PageRequest,
    ) -> Result<PageResponse<Notification>, AppError> {
        let mut items: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.target_user == target_user && n.is_visible())
            .filter(|n| is_read.is_none_or(|r| n.is_read == r))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(paginate(&items, page))
    }

    async fn count_unread(&self, target_user: Uuid) -> Result<u64, AppError> {
        Ok(self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.target_user == target_user && n.is_visible() && !n.is_read)
            .count() as u64)
    }

    async fn mark_read(&self, id: Uuid, target_user: Uuid) -> Result<bool, AppError> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&id) {
            Some(n) if n.target_user == target_user => {
                let now = Utc::now();
                n.is_read = true;
                n.read_at.get_or_insert(now);
                n.action_taken = true;
                n.action_taken_at.get_or_insert(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, target_user: Uuid) -> Result<u64, AppError> {
        let mut notifications = self.notifications.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for n in notifications
            .values_mut()
            .filter(|n| n.target_user == target_user && n.is_visible() && !n.is_read)
        {
            n.is_read = true;
            n.read_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }

    async fn delete(&self, id: Uuid, target_user: Uuid) -> Result<bool, AppError> {
        let mut notifications = self.notifications.write().await;
        match notifications.get(&id) {
            Some(n) if n.target_user == target_user => {
                notifications.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_action_taken_for_regularization(
        &self,
        regularization_id: Uuid,
        notification_type: NotificationType,
    ) -> Result<u64, AppError> {
        let mut notifications = self.notifications.write().await;
        let now = Utc::now();
        let mut updated = 0;
        for n in notifications.values_mut().filter(|n| {
            n.regularization_id == Some(regularization_id)
                && n.notification_type == notification_type
                && !n.action_taken
        }) {
            n.is_read = true;
            n.read_at.get_or_insert(now);
            n.action_taken = true;
            n.action_taken_at = Some(now);
            updated += 1;
        }
        Ok(updated)
    }
}
