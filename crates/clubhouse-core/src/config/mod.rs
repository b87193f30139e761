//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod database;
pub mod device;
pub mod import;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::{CorsConfig, ServerConfig};
pub use self::auth::AuthConfig;
pub use self::database::{DatabaseConfig, DatabaseProvider};
pub use self::device::{DeviceConfig, DeviceDriver};
pub use self::import::ImportConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (base file + environment overlay + `CLUBHOUSE__*` variables).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Bearer token validation settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Biometric terminal communication settings.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Attendance file import settings.
    #[serde(default)]
    pub import: ImportConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the base file at `path` with an optional `config/{env}` overlay
    /// and environment variables prefixed with `CLUBHOUSE__`.
    pub fn load(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CLUBHOUSE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            device: DeviceConfig::default(),
            import: ImportConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_files_fall_back_to_defaults() {
        let config = AppConfig::load("config/does-not-exist", "nowhere").expect("defaults");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.device.default_port, 4370);
        assert_eq!(config.device.status_timeout_ms, 2000);
        assert_eq!(config.import.max_file_size_bytes, 10 * 1024 * 1024);
        assert_eq!(config.database.provider, DatabaseProvider::Postgres);
    }
}
