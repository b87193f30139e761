//! # clubhouse-entity
//!
//! Domain entity models for the Clubhouse attendance platform. Every struct
//! in this crate represents a database table row or a domain value object.
//! Database entities derive `sqlx::FromRow`; enums map to Postgres enum
//! types via `sqlx::Type`.

pub mod attendance;
pub mod machine;
pub mod notification;
pub mod regularization;
pub mod staff;
pub mod user;
