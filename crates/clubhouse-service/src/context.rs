//! Request context carrying the authenticated caller and resolved permissions.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use clubhouse_auth::jwt::Claims;
use clubhouse_auth::permission::{Permission, PermissionSet};
use clubhouse_core::error::AppError;
use clubhouse_entity::user::UserRole;

/// Context for the current authenticated request.
///
/// Built from bearer token claims by the API layer and passed into service
/// methods so that every operation knows *who* is acting.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// The authenticated user's ID.
    pub user_id: Uuid,
    /// Login name.
    pub username: String,
    /// Name recorded on requests and approvals.
    pub display_name: String,
    /// The user's role at the time the token was issued.
    pub role: UserRole,
    permissions: PermissionSet,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(
        user_id: Uuid,
        username: impl Into<String>,
        display_name: Option<String>,
        role: UserRole,
        permissions: &[String],
    ) -> Self {
        let username = username.into();
        Self {
            user_id,
            display_name: display_name.unwrap_or_else(|| username.clone()),
            username,
            role,
            permissions: PermissionSet::new(role, permissions),
            request_time: Utc::now(),
        }
    }

    /// Creates a context from validated token claims.
    pub fn from_claims(claims: &Claims) -> Self {
        Self::new(
            claims.user_id(),
            claims.username.clone(),
            claims.name.clone(),
            claims.role,
            &claims.permissions,
        )
    }

    /// Returns whether the caller holds the top administrative role.
    pub fn is_superadmin(&self) -> bool {
        self.role.is_superadmin()
    }

    /// Returns whether the caller is an administrator.
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can(&self, permission: Permission) -> bool {
        self.permissions.allows(permission)
    }

    /// Fail with an authorization error unless the caller holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        self.permissions.require(permission)
    }
}
