//! CLI command definitions and dispatch.

pub mod import;
pub mod machine;
pub mod migrate;
pub mod serve;
pub mod token;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use clubhouse_core::config::AppConfig;
use clubhouse_core::error::AppError;

/// Clubhouse: biometric attendance reconciliation
#[derive(Debug, Parser)]
#[command(name = "clubhouse", version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file, without extension
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay loaded from `config/<env>`
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve(serve::ServeArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Terminal inspection
    Machine(machine::MachineArgs),
    /// Attendance file import
    Import(import::ImportArgs),
    /// Access token management
    Token(token::TokenArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = load_config(&self.config, &self.env)?;
        match &self.command {
            Commands::Serve(args) => serve::execute(args, config).await,
            Commands::Migrate(args) => migrate::execute(args, &config).await,
            Commands::Machine(args) => machine::execute(args, config, self.format).await,
            Commands::Import(args) => import::execute(args, config, self.format).await,
            Commands::Token(args) => token::execute(args, &config, self.format).await,
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: &str, env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path, env)
}
