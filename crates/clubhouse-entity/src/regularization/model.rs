//! Regularization request entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{RegularizationStatus, RequestType};

/// A request to change an attendance log, subject to approval.
///
/// Once `status` leaves `Pending` the record is never modified again.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegularizationRequest {
    /// Unique request identifier.
    pub id: Uuid,
    /// The log the request targets.
    pub attendance_log_id: Uuid,
    /// The user who filed the request.
    pub requested_by: Uuid,
    /// Requester name snapshot.
    pub requested_by_name: String,
    /// Requested change.
    pub request_type: RequestType,
    /// Values before the change, as supplied by the requester.
    pub original_data: Option<serde_json::Value>,
    /// Values after the change.
    pub requested_data: serde_json::Value,
    /// Free-text justification.
    pub reason: String,
    /// Lifecycle state.
    pub status: RegularizationStatus,
    /// The resolving user.
    pub approved_by: Option<Uuid>,
    /// Resolver name snapshot.
    pub approved_by_name: Option<String>,
    /// Resolver comment.
    pub approval_reason: Option<String>,
    /// When the request was resolved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Whether administrators were notified at creation.
    pub notification_sent: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
