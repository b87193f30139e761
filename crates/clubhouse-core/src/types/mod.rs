//! Core type definitions used across the Clubhouse workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
