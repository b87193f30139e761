//! Application builder: wires stores, device driver, services and router.

use std::sync::Arc;

use axum::Router;
use tracing::{error, info, warn};

use clubhouse_core::config::{AppConfig, DatabaseProvider, DeviceDriver};
use clubhouse_core::error::AppError;
use clubhouse_database::{DatabasePool, Stores};
use clubhouse_device::{DeviceConnector, DeviceGateway, MockDeviceConnector, ZkConnector};
use clubhouse_service::Services;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Open the configured stores.
async fn open_stores(config: &AppConfig) -> Result<Stores, AppError> {
    match config.database.provider {
        DatabaseProvider::Postgres => {
            let db = DatabasePool::open(&config.database).await?;
            Ok(Stores::postgres(&db))
        }
        DatabaseProvider::Memory => {
            warn!("Using in-memory stores; data will not survive a restart");
            Ok(Stores::memory())
        }
    }
}

/// The connector for the configured device driver.
pub fn device_connector(config: &AppConfig) -> Arc<dyn DeviceConnector> {
    match config.device.driver {
        DeviceDriver::Zk => Arc::new(ZkConnector::new()),
        DeviceDriver::Mock => {
            warn!("Using the mock device driver; no terminal will be contacted");
            Arc::new(MockDeviceConnector::new())
        }
    }
}

/// Construct the shared state from configuration.
pub async fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    let stores = open_stores(&config).await?;
    let gateway = DeviceGateway::new(device_connector(&config), &config.device);
    let services = Services::new(&stores, gateway, &config);
    Ok(AppState::new(config, services))
}

/// Runs the Clubhouse server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Clubhouse server...");
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = build_state(config).await?;
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!("Clubhouse server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    info!("Clubhouse server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
