//! Notification handlers. Every operation is scoped to the caller.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use clubhouse_service::notification::NotificationPage;

use crate::dto::request::NotificationQuery;
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams};
use crate::middleware::rbac::{self, NOTIFICATIONS_UPDATE, NOTIFICATIONS_VIEW};
use crate::state::AppState;

/// GET /api/biometric/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<ApiResponse<NotificationPage>>, ApiError> {
    rbac::require(&auth, NOTIFICATIONS_VIEW)?;
    let result = state
        .services
        .notifications
        .list(&auth, query.is_read, &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/biometric/notifications/count
pub async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    rbac::require(&auth, NOTIFICATIONS_VIEW)?;
    let count = state.services.notifications.unread_count(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/biometric/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    rbac::require(&auth, NOTIFICATIONS_UPDATE)?;
    state.services.notifications.mark_read(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Marked as read"))))
}

/// PUT /api/biometric/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<CountResponse>>, ApiError> {
    rbac::require(&auth, NOTIFICATIONS_UPDATE)?;
    let count = state.services.notifications.mark_all_read(&auth).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// DELETE /api/biometric/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    rbac::require(&auth, NOTIFICATIONS_UPDATE)?;
    state.services.notifications.delete(&auth, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Notification deleted"))))
}
