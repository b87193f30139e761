//! Notification domain entities.

pub mod kind;
pub mod model;

pub use kind::{NotificationPriority, NotificationType};
pub use model::Notification;
