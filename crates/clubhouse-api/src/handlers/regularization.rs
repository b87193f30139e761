//! Regularization request handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use bytes::Bytes;
use uuid::Uuid;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::PageResponse;
use clubhouse_entity::regularization::RegularizationRequest;
use clubhouse_service::regularization::RegularizationOutcome;

use crate::dto::request::{CreateRegularizationRequest, RegularizationQuery, ResolveRequest};
use crate::dto::response::ApiResponse;
use crate::dto::validate;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams, ValidJson};
use crate::middleware::rbac::{self, REGULARIZATION_APPROVE, REGULARIZATION_CREATE, REGULARIZATION_VIEW};
use crate::state::AppState;

/// The approve/reject body is optional.
fn resolve_body(body: &Bytes) -> Result<ResolveRequest, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ResolveRequest::default());
    }
    let req: ResolveRequest = serde_json::from_slice(body)
        .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))?;
    validate(&req)?;
    Ok(req)
}

/// POST /api/biometric/regularization
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateRegularizationRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegularizationOutcome>>), ApiError> {
    rbac::require(&auth, REGULARIZATION_CREATE)?;
    let outcome = state
        .services
        .regularization
        .create_request(auth.context(), req.into())
        .await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(outcome))))
}

/// GET /api/biometric/regularization
pub async fn list_requests(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(query): Query<RegularizationQuery>,
) -> Result<Json<ApiResponse<PageResponse<RegularizationRequest>>>, ApiError> {
    rbac::require(&auth, REGULARIZATION_VIEW)?;
    let requests = state
        .services
        .regularization
        .list(auth.context(), query.status, &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(requests)))
}

/// PUT /api/biometric/regularization/{id}/approve
pub async fn approve(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<RegularizationOutcome>>, ApiError> {
    rbac::require(&auth, REGULARIZATION_APPROVE)?;
    let req = resolve_body(&body)?;
    let outcome = state
        .services
        .regularization
        .approve(auth.context(), id, req.approval_reason)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// PUT /api/biometric/regularization/{id}/reject
pub async fn reject(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<ApiResponse<RegularizationOutcome>>, ApiError> {
    rbac::require(&auth, REGULARIZATION_APPROVE)?;
    let req = resolve_body(&body)?;
    let outcome = state
        .services
        .regularization
        .reject(auth.context(), id, req.approval_reason)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// GET /api/biometric/regularization/history/{attendance_log_id}
pub async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(attendance_log_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<RegularizationRequest>>>, ApiError> {
    rbac::require(&auth, REGULARIZATION_VIEW)?;
    let history = state.services.regularization.history(attendance_log_id).await?;
    Ok(Json(ApiResponse::ok(history)))
}
