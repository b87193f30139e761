//! Pooled PostgreSQL access backing the repositories.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use clubhouse_core::config::{DatabaseConfig, DatabaseProvider};
use clubhouse_core::error::{AppError, ErrorKind};

use crate::migration::run_migrations;

const SCHEMES: [&str; 2] = ["postgres://", "postgresql://"];

/// A sqlx pool opened from [`DatabaseConfig`].
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Connect to the configured PostgreSQL server.
    ///
    /// Fails with a configuration error when the provider is not postgres or
    /// the URL is not a PostgreSQL URL, before any network traffic.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        check_config(config)?;
        let target = redact_url(&config.url);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Cannot reach attendance database at {target}"),
                    e,
                )
            })?;

        info!(
            url = %target,
            max_connections = config.max_connections,
            "Attendance database connected"
        );
        Ok(Self { pool })
    }

    /// Connect, then apply pending migrations when `run_migrations` is set.
    pub async fn open(config: &DatabaseConfig) -> Result<Self, AppError> {
        let db = Self::connect(config).await?;
        if config.run_migrations {
            run_migrations(db.pool()).await?;
        }
        Ok(db)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Attendance database pool closed");
    }
}

fn check_config(config: &DatabaseConfig) -> Result<(), AppError> {
    if config.provider != DatabaseProvider::Postgres {
        return Err(AppError::configuration(
            "database.provider must be 'postgres' to open a connection pool",
        ));
    }
    if !SCHEMES.iter().any(|s| config.url.starts_with(s)) {
        return Err(AppError::configuration(format!(
            "database.url must start with postgres:// (got '{}')",
            redact_url(&config.url)
        )));
    }
    if config.max_connections == 0 {
        return Err(AppError::configuration("database.max_connections must be at least 1"));
    }
    Ok(())
}

/// The URL with any password replaced by `***`.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.rsplit_once('@') {
        Some((credentials, host)) => match credentials.split_once(':') {
            Some((user, _)) => format!("{scheme}://{user}:***@{host}"),
            None => url.to_string(),
        },
        None => url.to_string(),
    }
}
