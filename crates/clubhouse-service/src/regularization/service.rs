//! Regularization request lifecycle.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{error, info, warn};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::{PageRequest, PageResponse};
use clubhouse_database::store::{
    AttendanceLogStore, RegularizationFilter, RegularizationStore, Resolution, UserStore,
};
use clubhouse_entity::attendance::AttendanceLog;
use clubhouse_entity::notification::{NotificationPriority, NotificationType};
use clubhouse_entity::regularization::{RegularizationRequest, RegularizationStatus, RequestType};

use super::change::RequestedChange;
use crate::attendance::{AttendanceService, TimestampParser};
use crate::context::RequestContext;
use crate::notification::{NewNotification, NotificationService};

const AUTO_APPROVAL_REASON: &str = "Auto-approved by superadmin";

/// Input for a new request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRegularization {
    pub attendance_log_id: Uuid,
    pub request_type: RequestType,
    pub original_data: Option<Value>,
    pub requested_data: Value,
    pub reason: String,
}

/// A request after creation or resolution, with the apply result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegularizationOutcome {
    pub request: RegularizationRequest,
    /// Whether the requested change was applied. `None` while pending or
    /// after a rejection.
    pub applied: Option<bool>,
    pub apply_error: Option<String>,
    /// The log created or modified by the change.
    pub attendance_log: Option<AttendanceLog>,
}

impl RegularizationOutcome {
    fn unapplied(request: RegularizationRequest) -> Self {
        Self {
            request,
            applied: None,
            apply_error: None,
            attendance_log: None,
        }
    }
}

/// Drives requests through the approval state machine.
#[derive(Debug, Clone)]
pub struct RegularizationService {
    pub(super) requests: Arc<dyn RegularizationStore>,
    pub(super) attendance: Arc<dyn AttendanceLogStore>,
    pub(super) users: Arc<dyn UserStore>,
    pub(super) logs: AttendanceService,
    pub(super) notifications: NotificationService,
    pub(super) timestamps: TimestampParser,
}

impl RegularizationService {
    /// Creates a new regularization service.
    pub fn new(
        requests: Arc<dyn RegularizationStore>,
        attendance: Arc<dyn AttendanceLogStore>,
        users: Arc<dyn UserStore>,
        logs: AttendanceService,
        notifications: NotificationService,
        timestamps: TimestampParser,
    ) -> Self {
        Self {
            requests,
            attendance,
            users,
            logs,
            notifications,
            timestamps,
        }
    }

    /// File a request against an attendance log.
    ///
    /// Requests by a superadmin are approved and applied immediately; all
    /// others stay pending and notify every administrator.
    pub async fn create_request(
        &self,
        ctx: &RequestContext,
        input: NewRegularization,
    ) -> Result<RegularizationOutcome, AppError> {
        let reason = input.reason.trim();
        if reason.is_empty() {
            return Err(AppError::validation("reason is required"));
        }
        let change = RequestedChange::parse(input.request_type, &input.requested_data, &self.timestamps)?;
        let log = self.logs.get(input.attendance_log_id).await?;

        let now = Utc::now();
        let auto_approve = ctx.is_superadmin();
        let request = RegularizationRequest {
            id: Uuid::new_v4(),
            attendance_log_id: log.log_id,
            requested_by: ctx.user_id,
            requested_by_name: ctx.display_name.clone(),
            request_type: input.request_type,
            original_data: input.original_data,
            requested_data: input.requested_data,
            reason: reason.to_string(),
            status: if auto_approve {
                RegularizationStatus::Approved
            } else {
                RegularizationStatus::Pending
            },
            approved_by: auto_approve.then_some(ctx.user_id),
            approved_by_name: auto_approve.then(|| ctx.display_name.clone()),
            approval_reason: auto_approve.then(|| AUTO_APPROVAL_REASON.to_string()),
            approved_at: auto_approve.then_some(now),
            notification_sent: !auto_approve,
            created_at: now,
            updated_at: now,
        };
        let request = self.requests.create(&request).await?;
        info!(
            request_id = %request.id,
            log_id = %request.attendance_log_id,
            request_type = %request.request_type,
            status = %request.status,
            "Regularization request created"
        );

        if auto_approve {
            return Ok(self.apply_approved(request, &change).await);
        }

        self.notify_admins(&request, &log).await;
        Ok(RegularizationOutcome::unapplied(request))
    }

    async fn notify_admins(&self, request: &RegularizationRequest, log: &AttendanceLog) {
        let admins = match self.users.find_admins().await {
            Ok(admins) => admins,
            Err(e) => {
                error!(request_id = %request.id, error = %e, "Failed to load administrators");
                return;
            }
        };
        for admin in admins {
            let delivered = self
                .notifications
                .notify(NewNotification {
                    notification_type: NotificationType::RegularizationRequest,
                    title: "Attendance regularization request".to_string(),
                    message: format!(
                        "{} requested a {} regularization for {}'s attendance: {}",
                        request.requested_by_name,
                        request.request_type,
                        log.staff_name_snapshot,
                        request.reason
                    ),
                    target_user: admin.id,
                    priority: NotificationPriority::High,
                    regularization_id: Some(request.id),
                    attendance_log_id: Some(request.attendance_log_id),
                    requested_by: Some(request.requested_by),
                    requested_by_name: Some(request.requested_by_name.clone()),
                    metadata: Some(json!({
                        "request_type": request.request_type,
                        "staff_id": log.staff_id,
                        "staff_name": log.staff_name_snapshot,
                    })),
                })
                .await;
            if let Err(e) = delivered {
                warn!(request_id = %request.id, admin = %admin.id, error = %e, "Failed to notify administrator");
            }
        }
    }

    async fn resolve(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        status: RegularizationStatus,
        approval_reason: Option<String>,
    ) -> Result<RegularizationRequest, AppError> {
        let current = self
            .requests
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Regularization request {id} not found")))?;
        if !current.status.is_pending() {
            return Err(AppError::already_processed(format!(
                "Regularization request {id} is already {}",
                current.status
            )));
        }

        let resolution = Resolution {
            status,
            approved_by: ctx.user_id,
            approved_by_name: ctx.display_name.clone(),
            approval_reason: approval_reason
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty()),
            approved_at: Utc::now(),
        };
        let resolved = self.requests.resolve(id, &resolution).await?.ok_or_else(|| {
            AppError::already_processed(format!("Regularization request {id} was processed concurrently"))
        })?;

        if let Err(e) = self.notifications.close_requests(id).await {
            warn!(request_id = %id, error = %e, "Failed to close request notifications");
        }
        info!(request_id = %id, status = %status, by = %ctx.user_id, "Regularization request resolved");
        Ok(resolved)
    }

    async fn notify_requester(&self, request: &RegularizationRequest) {
        let (kind, verb) = match request.status {
            RegularizationStatus::Approved => (NotificationType::RegularizationApproved, "approved"),
            _ => (NotificationType::RegularizationRejected, "rejected"),
        };
        let approver = request.approved_by_name.as_deref().unwrap_or("An administrator");
        let mut message = format!(
            "Your {} regularization request was {verb} by {approver}",
            request.request_type
        );
        if let Some(reason) = &request.approval_reason {
            message.push_str(&format!(": {reason}"));
        }
        let delivered = self
            .notifications
            .notify(NewNotification {
                notification_type: kind,
                title: format!("Regularization request {verb}"),
                message,
                target_user: request.requested_by,
                priority: NotificationPriority::Medium,
                regularization_id: Some(request.id),
                attendance_log_id: Some(request.attendance_log_id),
                requested_by: Some(request.requested_by),
                requested_by_name: Some(request.requested_by_name.clone()),
                metadata: None,
            })
            .await;
        if let Err(e) = delivered {
            warn!(request_id = %request.id, error = %e, "Failed to notify requester");
        }
    }

    /// Approve a pending request and apply its change.
    pub async fn approve(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        approval_reason: Option<String>,
    ) -> Result<RegularizationOutcome, AppError> {
        let request = self
            .resolve(ctx, id, RegularizationStatus::Approved, approval_reason)
            .await?;

        let outcome = match RequestedChange::parse(
            request.request_type,
            &request.requested_data,
            &self.timestamps,
        ) {
            Ok(change) => self.apply_approved(request, &change).await,
            Err(e) => {
                error!(request_id = %id, error = %e, "Approved request carries an invalid change");
                RegularizationOutcome {
                    request,
                    applied: Some(false),
                    apply_error: Some(e.message),
                    attendance_log: None,
                }
            }
        };
        self.notify_requester(&outcome.request).await;
        Ok(outcome)
    }

    /// Reject a pending request. The attendance log is left untouched.
    pub async fn reject(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        approval_reason: Option<String>,
    ) -> Result<RegularizationOutcome, AppError> {
        let request = self
            .resolve(ctx, id, RegularizationStatus::Rejected, approval_reason)
            .await?;
        self.notify_requester(&request).await;
        Ok(RegularizationOutcome::unapplied(request))
    }

    /// Every request filed against a log, newest first.
    pub async fn history(&self, attendance_log_id: Uuid) -> Result<Vec<RegularizationRequest>, AppError> {
        self.requests.history(attendance_log_id).await
    }

    /// Administrators see every request; others only their own.
    pub async fn list(
        &self,
        ctx: &RequestContext,
        status: Option<RegularizationStatus>,
        page: &PageRequest,
    ) -> Result<PageResponse<RegularizationRequest>, AppError> {
        let filter = RegularizationFilter {
            requested_by: (!ctx.is_admin()).then_some(ctx.user_id),
            status,
        };
        self.requests.list(&filter, page).await
    }
}
