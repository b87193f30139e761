//! # clubhouse-api
//!
//! HTTP API layer for Clubhouse built on Axum.
//!
//! Provides the REST endpoints for machines, attendance, staff assignment,
//! regularization and notifications, plus middleware, extractors, DTOs and
//! error mapping.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, device_connector, run_server};
pub use error::ApiError;
pub use state::AppState;
