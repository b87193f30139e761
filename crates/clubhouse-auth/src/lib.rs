//! # clubhouse-auth
//!
//! Bearer token validation and permission checks. Tokens are issued by an
//! external identity provider (or the operator CLI) and carry the caller's
//! role and permission strings.

pub mod jwt;
pub mod permission;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
pub use permission::{Permission, PermissionSet};
