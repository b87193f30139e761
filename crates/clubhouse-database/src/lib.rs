//! # clubhouse-database
//!
//! Persistence for Clubhouse. Services depend only on the store traits in
//! [`store`]; [`repositories`] implements them on PostgreSQL and [`memory`]
//! implements them in process for development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;
pub mod stores;

pub use connection::DatabasePool;
pub use stores::Stores;
