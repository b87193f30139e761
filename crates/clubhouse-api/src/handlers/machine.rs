//! Machine management handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use uuid::Uuid;

use clubhouse_device::ScanHit;
use clubhouse_device::scan::parse_ports;
use clubhouse_entity::machine::Machine;
use clubhouse_service::machine::{ConnectionTest, MachineDetail, ScanRequest};

use crate::dto::request::{CreateMachineRequest, MachineListQuery, ScanQuery, UpdateMachineRequest};
use crate::dto::response::{ApiResponse, MessageResponse};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidJson};
use crate::middleware::rbac::{self, MACHINES_CREATE, MACHINES_DELETE, MACHINES_UPDATE, MACHINES_VIEW};
use crate::state::AppState;

/// GET /api/biometric/machines
pub async fn list_machines(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<MachineListQuery>,
) -> Result<Json<ApiResponse<Vec<Machine>>>, ApiError> {
    rbac::require(&auth, MACHINES_VIEW)?;
    let machines = state.services.machines.list(query.include_inactive).await?;
    Ok(Json(ApiResponse::ok(machines)))
}

/// GET /api/biometric/machines/{id}
pub async fn get_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MachineDetail>>, ApiError> {
    rbac::require(&auth, MACHINES_VIEW)?;
    let detail = state.services.machines.get(id).await?;
    Ok(Json(ApiResponse::ok(detail)))
}

/// POST /api/biometric/machines
pub async fn create_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateMachineRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Machine>>), ApiError> {
    rbac::require(&auth, MACHINES_CREATE)?;
    let machine = state.services.machines.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(machine))))
}

/// PUT /api/biometric/machines/{id}
pub async fn update_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidJson(req): ValidJson<UpdateMachineRequest>,
) -> Result<Json<ApiResponse<Machine>>, ApiError> {
    rbac::require(&auth, MACHINES_UPDATE)?;
    let machine = state.services.machines.update(id, req.into()).await?;
    Ok(Json(ApiResponse::ok(machine)))
}

/// DELETE /api/biometric/machines/{id}
pub async fn delete_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    rbac::require(&auth, MACHINES_DELETE)?;
    state.services.machines.delete(id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse::new("Machine deactivated"))))
}

/// GET /api/biometric/machines/{id}/test-connection
pub async fn test_connection(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ConnectionTest>>, ApiError> {
    rbac::require(&auth, MACHINES_VIEW)?;
    let result = state.services.machines.test_connection(id).await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/biometric/machines/scan?prefix=&start=&end=&ports=
pub async fn scan_network(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ScanQuery>,
) -> Result<Json<ApiResponse<Vec<ScanHit>>>, ApiError> {
    rbac::require(&auth, MACHINES_CREATE)?;
    let ports = match query.ports.as_deref() {
        Some(raw) => parse_ports(raw)?,
        None => vec![state.config.device.default_port],
    };
    let hits = state
        .services
        .machines
        .scan(ScanRequest {
            prefix: query.prefix,
            start: query.start,
            end: query.end,
            ports,
        })
        .await?;
    Ok(Json(ApiResponse::ok(hits)))
}
