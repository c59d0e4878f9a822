//! Database backend implementations
//!
//! This module contains concrete implementations of the
//! [`Backend`](crate::core::Backend) trait for the supported database systems.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteBackend;

#[cfg(feature = "postgres")]
pub use postgres::PostgresBackend;
