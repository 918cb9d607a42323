//! SQLite statement executor
//!
//! Runs statements on a single `rusqlite` connection. Calls are offloaded to
//! the blocking thread pool and bounded by an operation timeout. Failures are
//! reported with SQLite's extended result code so the classifier can tell a
//! unique violation (2067) from a foreign key violation (787).

use crate::core::classifier::classify_driver_error;
use crate::core::{
    database_types::DatabaseType,
    error::{DriverError, DriverResult, Result},
    executor::StatementExecutor,
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, Row};
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for database operations (30 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// SQLite executor over one connection
pub struct SqliteExecutor {
    connection: Arc<Mutex<Option<Connection>>>,
    operation_timeout: Duration,
}

impl SqliteExecutor {
    /// Create an executor with no open connection
    pub fn new() -> Self {
        Self {
            connection: Arc::new(Mutex::new(None)),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Open a database file (or `:memory:`) and return a connected executor
    pub async fn open(path: &str) -> Result<Self> {
        let executor = Self::new();
        executor
            .connect(path)
            .await
            .map_err(|e| classify_driver_error(e, DatabaseType::Sqlite))?;
        Ok(executor)
    }

    /// Set the timeout applied to every call
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Open a connection, replacing any existing one
    pub async fn connect(&self, path: &str) -> DriverResult<()> {
        *self.connection.lock() = None;

        let path = path.to_string();
        let connection_arc = Arc::clone(&self.connection);

        let mut task = tokio::task::spawn_blocking(move || -> DriverResult<()> {
            let conn = Connection::open(&path).map_err(driver_error)?;

            // Foreign keys are off by default in SQLite
            conn.execute("PRAGMA foreign_keys = ON", [])
                .map_err(driver_error)?;

            let mut connection = connection_arc.lock();
            *connection = Some(conn);
            tracing::debug!(path = %path, "sqlite connection opened");
            Ok(())
        });

        tokio::select! {
            result = &mut task => {
                result.map_err(join_error)?
            }
            _ = tokio::time::sleep(self.operation_timeout) => {
                task.abort();
                Err(timeout_error(self.operation_timeout))
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection
            .try_lock()
            .map(|conn| conn.is_some())
            .unwrap_or(false)
    }

    /// Close the connection; an open transaction is discarded by SQLite
    pub fn disconnect(&self) {
        *self.connection.lock() = None;
    }

    /// Run `f` against the connection on the blocking pool
    async fn run_blocking<T, F>(&self, f: F) -> DriverResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let connection_arc = Arc::clone(&self.connection);

        let mut task = tokio::task::spawn_blocking(move || -> DriverResult<T> {
            let connection = connection_arc.lock();
            let conn = connection.as_ref().ok_or_else(|| {
                DriverError::new("", "connection closed: not connected to database")
            })?;
            f(conn).map_err(driver_error)
        });

        // On timeout the call stops being awaited; a statement already running
        // on the blocking pool still finishes
        tokio::select! {
            result = &mut task => {
                result.map_err(join_error)?
            }
            _ = tokio::time::sleep(self.operation_timeout) => {
                task.abort();
                Err(timeout_error(self.operation_timeout))
            }
        }
    }

    /// Convert a rusqlite Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> rusqlite::Result<DatabaseRow> {
        let mut db_row = DatabaseRow::new();
        let column_count = row.as_ref().column_count();

        for i in 0..column_count {
            let column_name = row.as_ref().column_name(i)?.to_string();
            let value = match row.get_ref(i)? {
                rusqlite::types::ValueRef::Null => DatabaseValue::Null,
                rusqlite::types::ValueRef::Integer(v) => DatabaseValue::Long(v),
                rusqlite::types::ValueRef::Real(v) => DatabaseValue::Double(v),
                rusqlite::types::ValueRef::Text(v) => {
                    DatabaseValue::String(String::from_utf8_lossy(v).to_string())
                }
                rusqlite::types::ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
            };
            db_row.insert(column_name, value);
        }

        Ok(db_row)
    }
}

impl Default for SqliteExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Report a rusqlite error with its extended result code
fn driver_error(error: rusqlite::Error) -> DriverError {
    match &error {
        rusqlite::Error::SqliteFailure(failure, message) => {
            let message = message.clone().unwrap_or_else(|| failure.to_string());
            DriverError::new(failure.extended_code.to_string(), message).with_source(error)
        }
        _ => DriverError::new("", error.to_string()).with_source(error),
    }
}

fn join_error(error: tokio::task::JoinError) -> DriverError {
    DriverError::new("", format!("task join error: {}", error))
}

fn timeout_error(timeout: Duration) -> DriverError {
    DriverError::new(
        "",
        format!("operation timed out after {} ms", timeout.as_millis()),
    )
}

#[async_trait]
impl StatementExecutor for SqliteExecutor {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn execute(&self, sql: &str) -> DriverResult<u64> {
        let sql = sql.to_string();
        self.run_blocking(move |conn| conn.execute(&sql, []).map(|affected| affected as u64))
            .await
    }

    async fn query(&self, sql: &str) -> DriverResult<DatabaseResult> {
        let sql = sql.to_string();
        self.run_blocking(move |conn| {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], Self::row_to_database_row)?;
            let results = rows.collect::<rusqlite::Result<DatabaseResult>>()?;
            Ok(results)
        })
        .await
    }
}
