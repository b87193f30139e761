//! Route definitions for the Clubhouse HTTP API.
//!
//! All routes are mounted under `/api`. Only `/api/health` is reachable
//! without a bearer token.

use std::time::Duration;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Multipart framing allowance on top of the file size cap.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.import.max_file_size_bytes + MULTIPART_OVERHEAD_BYTES;

    let api_routes = Router::new()
        .merge(machine_routes())
        .merge(attendance_routes())
        .merge(import_routes().layer(DefaultBodyLimit::max(upload_limit)))
        .merge(staff_routes())
        .merge(regularization_routes())
        .merge(notification_routes())
        .route("/health", get(handlers::health::health));

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);
    let timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(state.config.server.max_body_bytes))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Machine CRUD, connection test and discovery
fn machine_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/machines",
            get(handlers::machine::list_machines).post(handlers::machine::create_machine),
        )
        .route("/biometric/machines/scan", get(handlers::machine::scan_network))
        .route(
            "/biometric/machines/{id}",
            get(handlers::machine::get_machine)
                .put(handlers::machine::update_machine)
                .delete(handlers::machine::delete_machine),
        )
        .route(
            "/biometric/machines/{id}/test-connection",
            get(handlers::machine::test_connection),
        )
}

/// Device sync, manual entry and queries
fn attendance_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/attendance",
            get(handlers::attendance::list_logs).post(handlers::attendance::create_log),
        )
        .route(
            "/biometric/attendance/sync/{machine_id}",
            post(handlers::attendance::sync_machine),
        )
        .route(
            "/biometric/attendance/import/sample",
            get(handlers::attendance::import_sample),
        )
        .route(
            "/biometric/attendance/machine/{machine_id}",
            get(handlers::attendance::logs_by_machine),
        )
        .route(
            "/biometric/attendance/staff/{staff_id}",
            get(handlers::attendance::logs_by_staff),
        )
        .route("/biometric/attendance/stats", get(handlers::attendance::stats))
}

/// File uploads, with their own body limit
fn import_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/attendance/import",
            post(handlers::attendance::import_file),
        )
        .route(
            "/biometric/attendance/import/validate",
            post(handlers::attendance::validate_import),
        )
}

/// Staff assignment and provisioning
fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/biometric/staff/assign", post(handlers::staff::assign))
        .route("/biometric/staff/{staff_id}", delete(handlers::staff::unassign))
        .route(
            "/biometric/staff/sync-to-machine/{machine_id}",
            post(handlers::staff::sync_to_machine),
        )
}

/// Regularization lifecycle
fn regularization_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/regularization",
            get(handlers::regularization::list_requests)
                .post(handlers::regularization::create_request),
        )
        .route(
            "/biometric/regularization/{id}/approve",
            put(handlers::regularization::approve),
        )
        .route(
            "/biometric/regularization/{id}/reject",
            put(handlers::regularization::reject),
        )
        .route(
            "/biometric/regularization/history/{attendance_log_id}",
            get(handlers::regularization::history),
        )
}

/// Per-user notification inbox
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/biometric/notifications",
            get(handlers::notification::list_notifications),
        )
        .route(
            "/biometric/notifications/count",
            get(handlers::notification::unread_count),
        )
        .route(
            "/biometric/notifications/read-all",
            put(handlers::notification::mark_all_read),
        )
        .route(
            "/biometric/notifications/{id}/read",
            put(handlers::notification::mark_read),
        )
        .route(
            "/biometric/notifications/{id}",
            delete(handlers::notification::delete_notification),
        )
}
