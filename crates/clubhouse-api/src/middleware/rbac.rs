//! Named permissions guarding the biometric and notification routes.

use clubhouse_auth::Permission;
use clubhouse_auth::permission::modules::{
    ATTENDANCE, BIOMETRIC_STAFF, MACHINES, NOTIFICATIONS, REGULARIZATION,
};
use clubhouse_core::error::AppError;

use crate::extractors::AuthUser;

pub const MACHINES_VIEW: Permission = Permission::new(MACHINES, "view");
pub const MACHINES_CREATE: Permission = Permission::new(MACHINES, "create");
pub const MACHINES_UPDATE: Permission = Permission::new(MACHINES, "update");
pub const MACHINES_DELETE: Permission = Permission::new(MACHINES, "delete");

pub const ATTENDANCE_VIEW: Permission = Permission::new(ATTENDANCE, "view");
pub const ATTENDANCE_CREATE: Permission = Permission::new(ATTENDANCE, "create");
pub const ATTENDANCE_SYNC: Permission = Permission::new(ATTENDANCE, "sync");
pub const ATTENDANCE_IMPORT: Permission = Permission::new(ATTENDANCE, "import");

pub const STAFF_ASSIGN: Permission = Permission::new(BIOMETRIC_STAFF, "assign");

pub const REGULARIZATION_VIEW: Permission = Permission::new(REGULARIZATION, "view");
pub const REGULARIZATION_CREATE: Permission = Permission::new(REGULARIZATION, "create");
pub const REGULARIZATION_APPROVE: Permission = Permission::new(REGULARIZATION, "approve");

pub const NOTIFICATIONS_VIEW: Permission = Permission::new(NOTIFICATIONS, "view");
pub const NOTIFICATIONS_UPDATE: Permission = Permission::new(NOTIFICATIONS, "update");

/// Checks that the authenticated user holds `permission`.
pub fn require(auth: &AuthUser, permission: Permission) -> Result<(), AppError> {
    auth.require(permission)
}
