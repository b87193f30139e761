//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{NotificationPriority, NotificationType};

/// A notice addressed to one user.
///
/// `is_read` and `action_taken` have independent lifecycles: marking all as
/// read leaves `action_taken` untouched, while resolving the underlying
/// request sets both.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub regularization_id: Option<Uuid>,
    pub attendance_log_id: Option<Uuid>,
    pub requested_by: Option<Uuid>,
    pub requested_by_name: Option<String>,
    /// The recipient.
    pub target_user: Uuid,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub action_taken: bool,
    pub action_taken_at: Option<DateTime<Utc>>,
    pub priority: NotificationPriority,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Whether the notification still appears in the recipient's inbox.
    pub fn is_visible(&self) -> bool {
        !self.action_taken
    }
}
