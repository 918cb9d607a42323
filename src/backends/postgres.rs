//! PostgreSQL statement executor
//!
//! Wraps a `tokio-postgres` client. Statements go through the simple query
//! protocol, so catalog rows come back as text and no server-side statement is
//! prepared for transaction-control commands. Failures carry their SQLSTATE.

use crate::core::classifier::classify_driver_error;
use crate::core::{
    database_types::DatabaseType,
    error::{DriverError, DriverResult, Result},
    executor::StatementExecutor,
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage, SimpleQueryRow};

/// Default timeout for database operations (30 seconds)
const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// PostgreSQL executor over one client connection
pub struct PostgresExecutor {
    client: Arc<Mutex<Option<Client>>>,
    operation_timeout: Duration,
}

impl PostgresExecutor {
    /// Create an executor with no open connection
    pub fn new() -> Self {
        Self {
            client: Arc::new(Mutex::new(None)),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Wrap an already connected client
    pub fn from_client(client: Client) -> Self {
        Self {
            client: Arc::new(Mutex::new(Some(client))),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Connect with a libpq-style connection string and return the executor
    pub async fn open(connection_string: &str) -> Result<Self> {
        let executor = Self::new();
        executor
            .connect(connection_string)
            .await
            .map_err(|e| classify_driver_error(e, DatabaseType::Postgres))?;
        Ok(executor)
    }

    /// Set the timeout applied to every call
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    pub async fn connect(&self, connection_string: &str) -> DriverResult<()> {
        {
            let mut client = self.client.lock().await;
            *client = None;
        }

        let connect_future = async {
            let (client, connection) = tokio_postgres::connect(connection_string, NoTls)
                .await
                .map_err(driver_error)?;

            // Spawn the connection handler in the background
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    tracing::error!(error = %e, "postgresql connection error");
                }
            });

            let mut client_guard = self.client.lock().await;
            *client_guard = Some(client);
            Ok::<(), DriverError>(())
        };

        tokio::time::timeout(self.operation_timeout, connect_future)
            .await
            .map_err(|_| timeout_error(self.operation_timeout))?
    }

    pub fn is_connected(&self) -> bool {
        self.client
            .try_lock()
            .map(|client| client.as_ref().is_some_and(|c| !c.is_closed()))
            .unwrap_or(false)
    }

    pub async fn disconnect(&self) {
        let mut client = self.client.lock().await;
        *client = None;
    }

    async fn simple_query(&self, sql: &str) -> DriverResult<Vec<SimpleQueryMessage>> {
        let client = self.client.lock().await;
        let client = client
            .as_ref()
            .ok_or_else(|| DriverError::new("", "connection closed: not connected to database"))?;

        tokio::time::timeout(self.operation_timeout, client.simple_query(sql))
            .await
            .map_err(|_| timeout_error(self.operation_timeout))?
            .map_err(driver_error)
    }

    fn row_to_database_row(row: &SimpleQueryRow) -> DatabaseRow {
        row.columns()
            .iter()
            .enumerate()
            .map(|(idx, column)| {
                let value = match row.get(idx) {
                    Some(text) => DatabaseValue::String(text.to_string()),
                    None => DatabaseValue::Null,
                };
                (column.name().to_string(), value)
            })
            .collect()
    }
}

impl Default for PostgresExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Report a tokio-postgres error with its SQLSTATE
fn driver_error(error: tokio_postgres::Error) -> DriverError {
    let code = error.code().map(|state| state.code().to_string()).unwrap_or_default();
    let message = match error.as_db_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    };
    DriverError::new(code, message).with_source(error)
}

fn timeout_error(timeout: Duration) -> DriverError {
    DriverError::new(
        "",
        format!("operation timed out after {} ms", timeout.as_millis()),
    )
}

#[async_trait]
impl StatementExecutor for PostgresExecutor {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn execute(&self, sql: &str) -> DriverResult<u64> {
        let messages = self.simple_query(sql).await?;
        let affected = messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::CommandComplete(count) => Some(*count),
                _ => None,
            })
            .last()
            .unwrap_or(0);
        Ok(affected)
    }

    async fn query(&self, sql: &str) -> DriverResult<DatabaseResult> {
        let messages = self.simple_query(sql).await?;
        let rows = messages
            .iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(Self::row_to_database_row(row)),
                _ => None,
            })
            .collect();
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    #[test]
    fn test_new_executor_is_disconnected() {
        let db = PostgresExecutor::new();
        assert!(!db.is_connected());
        assert_eq!(db.database_type(), DatabaseType::Postgres);
    }

    #[tokio::test]
    async fn test_execute_without_connection() {
        let db = PostgresExecutor::new();
        let err = db.execute("BEGIN").await.unwrap_err();
        assert_eq!(
            classify_driver_error(err, DatabaseType::Postgres).kind(),
            ErrorKind::ConnectionError
        );
    }

    #[tokio::test]
    #[ignore] // Requires a running PostgreSQL server
    async fn test_postgres_connect() -> Result<()> {
        let db = PostgresExecutor::open("host=localhost user=postgres").await?;
        assert!(db.is_connected());
        let rows = db
            .query("SELECT current_schema() AS schema")
            .await
            .map_err(|e| classify_driver_error(e, DatabaseType::Postgres))?;
        assert_eq!(rows[0].get_string("schema").as_deref(), Some("public"));
        Ok(())
    }
}
