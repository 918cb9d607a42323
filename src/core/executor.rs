//! Statement execution boundary
//!
//! The core never talks to a driver directly. It formats statements and hands
//! them to a [`StatementExecutor`], which reports failures as raw
//! [`DriverError`](super::error::DriverError)s for the classifier to normalize.

use super::database_types::DatabaseType;
use super::error::DriverResult;
use super::value::DatabaseResult;
use async_trait::async_trait;
use std::sync::Arc;

/// Executes SQL text on one connection
///
/// Implementations own connection handling, timeouts and cancellation; the
/// core imposes none of its own.
#[async_trait]
pub trait StatementExecutor: Send + Sync {
    /// Backend identity of the underlying connection
    fn database_type(&self) -> DatabaseType;

    /// Execute a statement that doesn't return rows, returning the affected row count
    async fn execute(&self, sql: &str) -> DriverResult<u64>;

    /// Execute a statement and return its rows
    async fn query(&self, sql: &str) -> DriverResult<DatabaseResult>;
}

#[async_trait]
impl<T: StatementExecutor + ?Sized> StatementExecutor for Arc<T> {
    fn database_type(&self) -> DatabaseType {
        (**self).database_type()
    }

    async fn execute(&self, sql: &str) -> DriverResult<u64> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> DriverResult<DatabaseResult> {
        (**self).query(sql).await
    }
}

#[async_trait]
impl<'a, T: StatementExecutor + ?Sized> StatementExecutor for &'a T {
    fn database_type(&self) -> DatabaseType {
        (**self).database_type()
    }

    async fn execute(&self, sql: &str) -> DriverResult<u64> {
        (**self).execute(sql).await
    }

    async fn query(&self, sql: &str) -> DriverResult<DatabaseResult> {
        (**self).query(sql).await
    }
}
