//! User role enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator roles.
///
/// `SuperAdmin` is the top administrative role; `SuperAdmin` and `Admin`
/// together form the administrators that receive approval requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    SuperAdmin,
    Admin,
    Manager,
    Staff,
}

impl UserRole {
    /// Check if this is the top administrative role.
    pub fn is_superadmin(&self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Check if this role may resolve regularization requests.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::SuperAdmin | Self::Admin)
    }

    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SuperAdmin => "superadmin",
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = clubhouse_core::AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['_', '-'], "").as_str() {
            "superadmin" => Ok(Self::SuperAdmin),
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "staff" => Ok(Self::Staff),
            _ => Err(clubhouse_core::AppError::validation(format!(
                "Invalid user role: '{s}'. Expected one of: superadmin, admin, manager, staff"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_set() {
        assert!(UserRole::SuperAdmin.is_admin());
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::Manager.is_admin());
        assert!(!UserRole::Admin.is_superadmin());
    }

    #[test]
    fn test_from_str() {
        assert_eq!("super_admin".parse::<UserRole>().unwrap(), UserRole::SuperAdmin);
        assert_eq!("ADMIN".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!("owner".parse::<UserRole>().is_err());
    }
}
