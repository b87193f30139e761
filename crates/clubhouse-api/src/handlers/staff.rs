//! Staff-to-terminal assignment handlers.

use axum::Json;
use axum::extract::{Path, State};

use clubhouse_service::identity::{AssignmentResult, BulkProvisionReport, UnassignResult};

use crate::dto::request::AssignStaffRequest;
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::middleware::rbac::{self, STAFF_ASSIGN};
use crate::state::AppState;

/// POST /api/biometric/staff/assign
pub async fn assign(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<AssignStaffRequest>,
) -> Result<Json<ApiResponse<AssignmentResult>>, ApiError> {
    rbac::require(&auth, STAFF_ASSIGN)?;
    let result = state
        .services
        .identity
        .assign(req.staff_id.trim(), req.machine_id.trim())
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// DELETE /api/biometric/staff/{staff_id}
pub async fn unassign(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(staff_id): Path<String>,
) -> Result<Json<ApiResponse<UnassignResult>>, ApiError> {
    rbac::require(&auth, STAFF_ASSIGN)?;
    let result = state.services.identity.unassign(&staff_id).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// POST /api/biometric/staff/sync-to-machine/{machine_id}
pub async fn sync_to_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(machine_id): Path<String>,
) -> Result<Json<ApiResponse<BulkProvisionReport>>, ApiError> {
    rbac::require(&auth, STAFF_ASSIGN)?;
    let report = state.services.identity.sync_to_machine(&machine_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}
