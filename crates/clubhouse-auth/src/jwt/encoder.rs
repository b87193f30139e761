//! JWT token creation.

use chrono::{DateTime, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use clubhouse_core::config::AuthConfig;
use clubhouse_core::error::AppError;
use clubhouse_entity::user::UserRole;

use super::claims::Claims;

/// Signs bearer tokens for operator tooling and tests.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl_minutes: i64,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder")
            .field("ttl_minutes", &self.ttl_minutes)
            .finish()
    }
}

/// A freshly signed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl JwtEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            ttl_minutes: config.token_ttl_minutes as i64,
        }
    }

    /// Sign a token for the given identity.
    pub fn issue(
        &self,
        user_id: Uuid,
        username: &str,
        name: Option<&str>,
        role: UserRole,
        permissions: Vec<String>,
    ) -> Result<IssuedToken, AppError> {
        let now = Utc::now();
        let expires_at = now + chrono::Duration::minutes(self.ttl_minutes);
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            name: name.map(str::to_string),
            role,
            permissions,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to sign token: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }
}
