//! Access token management.

use chrono::Utc;
use clap::{Args, Subcommand};
use uuid::Uuid;

use crate::output::{self, OutputFormat};
use clubhouse_auth::jwt::JwtEncoder;
use clubhouse_core::config::{AppConfig, DatabaseProvider};
use clubhouse_core::error::AppError;
use clubhouse_database::{DatabasePool, Stores};
use clubhouse_entity::user::{User, UserRole};

/// Arguments for token commands
#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Token subcommand
    #[command(subcommand)]
    pub command: TokenCommand,
}

/// Token subcommands
#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Sign a bearer token for a user
    Issue {
        /// Login name carried in the token
        #[arg(short, long)]
        username: String,
        /// Role: superadmin, admin, manager or staff
        #[arg(short, long, default_value = "staff")]
        role: String,
        /// Display name
        #[arg(long)]
        name: Option<String>,
        /// Existing user id; a new one is generated when omitted
        #[arg(long)]
        user_id: Option<Uuid>,
        /// Permission grant such as attendance:view (repeatable)
        #[arg(short, long = "permission")]
        permissions: Vec<String>,
        /// Also store the user so it can receive notifications
        #[arg(long)]
        register: bool,
    },
}

/// Execute token commands
pub async fn execute(
    args: &TokenArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        TokenCommand::Issue {
            username,
            role,
            name,
            user_id,
            permissions,
            register,
        } => {
            let role: UserRole = role.parse()?;
            let user_id = user_id.unwrap_or_else(Uuid::new_v4);

            if *register {
                register_user(config, user_id, username, name.clone(), role).await?;
            }

            let issued = JwtEncoder::new(&config.auth).issue(
                user_id,
                username,
                name.as_deref(),
                role,
                permissions.clone(),
            )?;

            match format {
                OutputFormat::Json => output::print_json(&serde_json::json!({
                    "user_id": user_id,
                    "username": username,
                    "role": role,
                    "token": issued.token,
                    "expires_at": issued.expires_at,
                })),
                OutputFormat::Table => {
                    output::print_kv("User ID", user_id);
                    output::print_kv("Role", role);
                    output::print_kv("Expires", issued.expires_at.to_rfc3339());
                    println!();
                    println!("{}", issued.token);
                }
            }
        }
    }
    Ok(())
}

async fn register_user(
    config: &AppConfig,
    id: Uuid,
    username: &str,
    display_name: Option<String>,
    role: UserRole,
) -> Result<(), AppError> {
    if config.database.provider != DatabaseProvider::Postgres {
        return Err(AppError::configuration(
            "Registering users requires the postgres database provider",
        ));
    }
    let pool = DatabasePool::connect(&config.database).await?;
    let stores = Stores::postgres(&pool);
    stores
        .users
        .create(&User {
            id,
            username: username.to_string(),
            display_name,
            role,
            is_active: true,
            created_at: Utc::now(),
        })
        .await?;
    pool.close().await;
    output::print_success(&format!("Registered user '{username}'"));
    Ok(())
}
