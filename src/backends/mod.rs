//! Statement executor implementations
//!
//! This module contains concrete implementations of the StatementExecutor
//! trait for the bundled drivers.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteExecutor;

#[cfg(feature = "postgres")]
pub use postgres::PostgresExecutor;
