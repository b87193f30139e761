//! Named permission checks.
//!
//! A permission string is `module:action`. A grant of `module:all` covers
//! every action of the module and `*` covers everything. The superadmin
//! role passes every check.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use clubhouse_core::error::AppError;
use clubhouse_entity::user::UserRole;

/// Wildcard grant.
pub const WILDCARD: &str = "*";
/// Action that covers every action of a module.
pub const ALL_ACTIONS: &str = "all";

/// Permission modules.
pub mod modules {
    pub const MACHINES: &str = "machines";
    pub const ATTENDANCE: &str = "attendance";
    pub const BIOMETRIC_STAFF: &str = "biometric_staff";
    pub const REGULARIZATION: &str = "regularization";
    pub const NOTIFICATIONS: &str = "notifications";
}

/// A required permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Permission {
    pub module: &'static str,
    pub action: &'static str,
}

impl Permission {
    pub const fn new(module: &'static str, action: &'static str) -> Self {
        Self { module, action }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.action)
    }
}

/// The grants carried by one caller.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    role: Option<UserRole>,
    grants: HashSet<String>,
}

impl PermissionSet {
    pub fn new(role: UserRole, grants: &[String]) -> Self {
        Self {
            role: Some(role),
            grants: grants.iter().map(|g| g.trim().to_lowercase()).collect(),
        }
    }

    /// Whether the caller holds `permission`.
    pub fn allows(&self, permission: Permission) -> bool {
        if self.role.is_some_and(|r| r.is_superadmin()) || self.grants.contains(WILDCARD) {
            return true;
        }
        self.grants.contains(&permission.to_string())
            || self
                .grants
                .contains(&format!("{}:{}", permission.module, ALL_ACTIONS))
    }

    /// Fail with an authorization error unless the caller holds `permission`.
    pub fn require(&self, permission: Permission) -> Result<(), AppError> {
        if self.allows(permission) {
            Ok(())
        } else {
            tracing::debug!(permission = %permission, "Permission denied");
            Err(AppError::authorization(format!(
                "Missing required permission '{permission}'"
            )))
        }
    }
}
