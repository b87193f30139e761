//! Application of approved changes to attendance logs.

use tracing::{error, info};
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_entity::attendance::AttendanceLog;
use clubhouse_entity::regularization::RegularizationRequest;

use super::change::RequestedChange;
use super::service::{RegularizationOutcome, RegularizationService};

impl RegularizationService {
    /// Apply `change` to the log behind `log_id`.
    ///
    /// `add_log` creates a fresh log; the other changes act on `log_id`,
    /// which must not be soft-deleted.
    pub async fn apply_changes(
        &self,
        log_id: Uuid,
        change: &RequestedChange,
    ) -> Result<AttendanceLog, AppError> {
        let missing = || AppError::not_found(format!("Attendance log {log_id} not found"));
        if !matches!(change, RequestedChange::AddLog(_)) {
            // Soft-deleted logs are gone for every later change.
            self.logs.get(log_id).await?;
        }
        match change {
            RequestedChange::TimeChange { timestamp } => self
                .attendance
                .update_timestamp(log_id, *timestamp)
                .await?
                .ok_or_else(missing),
            RequestedChange::StatusChange { status } => self
                .attendance
                .update_status(log_id, *status)
                .await?
                .ok_or_else(missing),
            RequestedChange::AddLog(new_log) => self.logs.create_log(new_log).await,
            RequestedChange::DeleteLog => self
                .attendance
                .soft_delete(log_id)
                .await?
                .ok_or_else(missing),
        }
    }

    /// Apply the change of an approved request, reporting failure in the
    /// outcome. The approval itself stays in place.
    pub(super) async fn apply_approved(
        &self,
        request: RegularizationRequest,
        change: &RequestedChange,
    ) -> RegularizationOutcome {
        match self.apply_changes(request.attendance_log_id, change).await {
            Ok(log) => {
                info!(
                    request_id = %request.id,
                    log_id = %log.log_id,
                    request_type = %request.request_type,
                    "Regularization applied"
                );
                RegularizationOutcome {
                    request,
                    applied: Some(true),
                    apply_error: None,
                    attendance_log: Some(log),
                }
            }
            Err(e) => {
                error!(
                    request_id = %request.id,
                    log_id = %request.attendance_log_id,
                    error = %e,
                    "Failed to apply approved regularization"
                );
                RegularizationOutcome {
                    request,
                    applied: Some(false),
                    apply_error: Some(e.message),
                    attendance_log: None,
                }
            }
        }
    }
}
