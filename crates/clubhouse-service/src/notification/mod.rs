//! Per-recipient notifications.

pub mod service;

pub use service::{NewNotification, NotificationPage, NotificationService};
