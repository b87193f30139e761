//! Attendance sync, import, manual entry and query handlers.

use axum::Json;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use bytes::Bytes;

use clubhouse_core::error::AppError;
use clubhouse_core::types::pagination::PageResponse;
use clubhouse_database::store::AttendanceFilter;
use clubhouse_entity::attendance::AttendanceLog;
use clubhouse_service::attendance::sample::sample;
use clubhouse_service::attendance::{AttendanceStats, ImportFormat, ImportReport, SyncReport};

use crate::dto::request::{AttendanceQuery, CreateLogRequest, SampleQuery};
use crate::dto::response::ApiResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, PaginationParams, ValidJson};
use crate::middleware::rbac::{self, ATTENDANCE_CREATE, ATTENDANCE_IMPORT, ATTENDANCE_SYNC, ATTENDANCE_VIEW};
use crate::state::AppState;

/// POST /api/biometric/attendance/sync/{machine_id}
pub async fn sync_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(machine_id): Path<String>,
) -> Result<Json<ApiResponse<SyncReport>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_SYNC)?;
    let report = state.services.ingest.sync_machine(&machine_id).await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// A parsed import form.
struct Upload {
    machine_id: String,
    content: String,
    format: ImportFormat,
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<Upload, AppError> {
    let mut machine_id: Option<String> = None;
    let mut format: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut data: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "machine_id" => {
                machine_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "format" => {
                format = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            "file" => {
                file_name = field.file_name().map(String::from);
                data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| AppError::validation(format!("Read error: {e}")))?,
                );
            }
            _ => {}
        }
    }

    let machine_id = machine_id
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::validation("machine_id is required"))?;
    let data = data.ok_or_else(|| AppError::validation("file is required"))?;

    let limit = state.config.import.max_file_size_bytes;
    if data.len() > limit {
        return Err(AppError::validation(format!(
            "File exceeds the maximum size of {limit} bytes"
        )));
    }

    let format = match format.as_deref().map(str::trim).filter(|f| !f.is_empty()) {
        Some(explicit) => explicit.parse::<ImportFormat>()?,
        None => file_name
            .as_deref()
            .and_then(ImportFormat::from_filename)
            .ok_or_else(|| {
                AppError::validation("Unsupported file format. Only csv and txt files are accepted")
            })?,
    };
    let content = String::from_utf8(data.to_vec())
        .map_err(|_| AppError::validation("File must be UTF-8 encoded text"))?;

    Ok(Upload {
        machine_id,
        content,
        format,
    })
}

/// POST /api/biometric/attendance/import
pub async fn import_file(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_IMPORT)?;
    let upload = read_upload(&state, multipart).await?;
    let report = state
        .services
        .ingest
        .import_file(&upload.machine_id, &upload.content, upload.format)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// POST /api/biometric/attendance/import/validate
pub async fn validate_import(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<Json<ApiResponse<ImportReport>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_IMPORT)?;
    let upload = read_upload(&state, multipart).await?;
    let report = state
        .services
        .ingest
        .validate_file(&upload.machine_id, &upload.content, upload.format)
        .await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/biometric/attendance/import/sample?format=csv|txt
pub async fn import_sample(
    auth: AuthUser,
    Query(query): Query<SampleQuery>,
) -> Result<impl IntoResponse, ApiError> {
    rbac::require(&auth, ATTENDANCE_VIEW)?;
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ImportFormat>()?,
        None => ImportFormat::Csv,
    };
    let content_type = match format {
        ImportFormat::Csv => "text/csv; charset=utf-8",
        ImportFormat::Txt => "text/plain; charset=utf-8",
    };
    let disposition = format!("attachment; filename=\"attendance_sample.{format}\"");
    Ok((
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        sample(format),
    ))
}

/// GET /api/biometric/attendance
pub async fn list_logs(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<PageResponse<AttendanceLog>>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_VIEW)?;
    let logs = state
        .services
        .attendance
        .list(&filter.into(), &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// POST /api/biometric/attendance
pub async fn create_log(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidJson(req): ValidJson<CreateLogRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AttendanceLog>>), ApiError> {
    rbac::require(&auth, ATTENDANCE_CREATE)?;
    let log = state.services.attendance.create_log(&req.into()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(log))))
}

/// GET /api/biometric/attendance/machine/{machine_id}
pub async fn logs_by_machine(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(machine_id): Path<String>,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<PageResponse<AttendanceLog>>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_VIEW)?;
    let logs = state
        .services
        .attendance
        .by_machine(&machine_id, filter.into(), &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// GET /api/biometric/attendance/staff/{staff_id}
pub async fn logs_by_staff(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(staff_id): Path<String>,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<PageResponse<AttendanceLog>>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_VIEW)?;
    let logs = state
        .services
        .attendance
        .by_staff(&staff_id, filter.into(), &page.into_page_request())
        .await?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// GET /api/biometric/attendance/stats
pub async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(filter): Query<AttendanceQuery>,
) -> Result<Json<ApiResponse<AttendanceStats>>, ApiError> {
    rbac::require(&auth, ATTENDANCE_VIEW)?;
    let filter: AttendanceFilter = filter.into();
    let stats = state.services.attendance.stats(&filter).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
