//! Transaction coordination with savepoint emulation
//!
//! [`TransactionCoordinator`] owns the transaction state of one connection.
//! The outermost `begin()` opens a real transaction; nested calls become
//! savepoints named after their nesting depth. Deferred constraints are
//! checked by the backend at the outermost `COMMIT`, so a violation surfaces
//! there as a classified constraint error.
//!
//! All state-changing operations take `&mut self`: a session has one owner and
//! is used sequentially, and no locking happens here.
//!
//! # Example
//!
//! ```rust,no_run
//! use rust_database_core::prelude::*;
//!
//! # async fn example() -> Result<()> {
//! let db = SqliteExecutor::open(":memory:").await?;
//! let mut tx = TransactionCoordinator::new(db);
//!
//! tx.execute("CREATE TABLE accounts (id INTEGER PRIMARY KEY, balance REAL)").await?;
//! tx.run_in_transaction(|tx| {
//!     Box::pin(async move {
//!         tx.execute("INSERT INTO accounts (balance) VALUES (100.0)").await?;
//!         Ok(())
//!     })
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use super::capabilities::BackendCapabilities;
use super::classifier::classify_driver_error;
use super::database_types::DatabaseType;
use super::error::{ClassifiedError, DatabaseError, DriverError, ErrorKind, Result};
use super::executor::StatementExecutor;
use super::value::DatabaseResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;

/// Future returned by the work closure of [`TransactionCoordinator::run_in_transaction`]
pub type WorkFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Default prefix of emulated savepoint names
pub const DEFAULT_SAVEPOINT_PREFIX: &str = "savepoint_";

/// What to do when `ROLLBACK TO SAVEPOINT` itself fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SavepointFailurePolicy {
    /// Drop the nesting level and mark the outer transaction rollback-only
    #[default]
    MarkRollbackOnly,
    /// Roll back the whole transaction immediately
    RollbackOuter,
}

/// Coordinator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionConfig {
    /// Emulate nested transactions with savepoints
    pub nest_with_savepoints: bool,
    /// Prefix of savepoint identifiers; only `[A-Za-z0-9_]` is kept
    pub savepoint_prefix: String,
    /// Behavior when rolling back to a savepoint fails
    pub savepoint_failure_policy: SavepointFailurePolicy,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            nest_with_savepoints: true,
            savepoint_prefix: DEFAULT_SAVEPOINT_PREFIX.to_string(),
            savepoint_failure_policy: SavepointFailurePolicy::default(),
        }
    }
}

impl TransactionConfig {
    /// Enable or disable savepoint emulation for nested `begin()` calls
    pub fn with_nested_savepoints(mut self, enabled: bool) -> Self {
        self.nest_with_savepoints = enabled;
        self
    }

    /// Set the savepoint name prefix
    pub fn with_savepoint_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.savepoint_prefix = prefix.into();
        self
    }

    /// Set the savepoint rollback failure policy
    pub fn with_savepoint_failure_policy(mut self, policy: SavepointFailurePolicy) -> Self {
        self.savepoint_failure_policy = policy;
        self
    }

    /// Savepoint identifier for a nesting depth.
    ///
    /// Names are unique per depth, so a name never collides with one still on
    /// the stack. The prefix is reduced to a bare SQL identifier.
    pub fn savepoint_name(&self, depth: usize) -> String {
        let mut prefix: String = self
            .savepoint_prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        if prefix.is_empty() {
            prefix = DEFAULT_SAVEPOINT_PREFIX.to_string();
        } else if prefix.starts_with(|c: char| c.is_ascii_digit()) {
            prefix.insert(0, '_');
        }
        format!("{}{}", prefix, depth)
    }
}

/// Observable state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// No transaction open
    Idle,
    /// Outermost transaction open (depth 1)
    Active,
    /// Inside at least one savepoint (depth > 1)
    Nested(usize),
}

/// Failure that left the transaction needing a rollback
#[derive(Debug, Clone, PartialEq, Eq)]
struct RollbackOnly {
    depth: usize,
    kind: ErrorKind,
    code: String,
    message: String,
}

impl RollbackOnly {
    fn from_error(depth: usize, error: &DatabaseError) -> Self {
        let (code, message) = match error.classified() {
            Some(classified) => (
                classified.raw_code().to_string(),
                classified.raw_message().to_string(),
            ),
            None => (String::new(), error.to_string()),
        };
        Self {
            depth,
            kind: error.kind(),
            code,
            message,
        }
    }

    fn to_error(&self, backend: DatabaseType) -> DatabaseError {
        let kind = if self.kind.is_driver_kind() {
            self.kind
        } else {
            ErrorKind::UnknownDriverError
        };
        ClassifiedError::new(
            kind,
            backend,
            self.code.clone(),
            format!("transaction is rollback-only after: {}", self.message),
            None,
        )
        .into()
    }
}

/// Per-connection transaction state
#[derive(Debug, Default)]
pub struct TransactionSession {
    depth: usize,
    savepoints: Vec<String>,
    rollback_only: Option<RollbackOnly>,
    deferred_constraints: BTreeSet<String>,
}

impl TransactionSession {
    /// Current nesting depth (0 when idle)
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Savepoints currently open, outermost first
    pub fn savepoints(&self) -> &[String] {
        &self.savepoints
    }

    pub fn state(&self) -> TransactionState {
        match self.depth {
            0 => TransactionState::Idle,
            1 => TransactionState::Active,
            depth => TransactionState::Nested(depth),
        }
    }

    /// Whether an earlier failure requires the transaction to be rolled back
    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only.is_some()
    }

    /// Constraints deferred in the current transaction
    pub fn deferred_constraints(&self) -> impl Iterator<Item = &str> {
        self.deferred_constraints.iter().map(String::as_str)
    }

    fn push(&mut self, savepoint: String) {
        self.savepoints.push(savepoint);
        self.depth += 1;
    }

    fn pop(&mut self) {
        self.savepoints.pop();
        self.depth -= 1;
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn mark_rollback_only(&mut self, depth: usize, error: &DatabaseError) {
        let covered = self
            .rollback_only
            .as_ref()
            .is_some_and(|existing| existing.depth <= depth);
        if !covered {
            self.rollback_only = Some(RollbackOnly::from_error(depth, error));
        }
    }

    fn clear_rollback_only_from(&mut self, depth: usize) {
        if self
            .rollback_only
            .as_ref()
            .is_some_and(|marker| marker.depth >= depth)
        {
            self.rollback_only = None;
        }
    }
}

/// Coordinates transactions, savepoints and constraint deferral on one executor
pub struct TransactionCoordinator<E: StatementExecutor> {
    executor: E,
    database_type: DatabaseType,
    capabilities: BackendCapabilities,
    config: TransactionConfig,
    session: TransactionSession,
}

impl<E: StatementExecutor> TransactionCoordinator<E> {
    /// Create a coordinator with the default configuration
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, TransactionConfig::default())
    }

    /// Create a coordinator with an explicit configuration
    pub fn with_config(executor: E, config: TransactionConfig) -> Self {
        let database_type = executor.database_type();
        Self {
            executor,
            database_type,
            capabilities: database_type.capabilities(),
            config,
            session: TransactionSession::default(),
        }
    }

    /// Replace the capability descriptor derived from the backend identity
    pub fn with_capabilities(mut self, capabilities: BackendCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    pub fn capabilities(&self) -> &BackendCapabilities {
        &self.capabilities
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    pub fn session(&self) -> &TransactionSession {
        &self.session
    }

    pub fn depth(&self) -> usize {
        self.session.depth()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    pub fn state(&self) -> TransactionState {
        self.session.state()
    }

    fn classify(&self, error: DriverError) -> DatabaseError {
        classify_driver_error(error, self.database_type).into()
    }

    /// Issue a transaction-control statement without touching session state
    async fn issue(&self, sql: &str) -> Result<()> {
        tracing::debug!(
            backend = %self.database_type,
            depth = self.session.depth,
            sql,
            "issuing transaction statement"
        );
        match self.executor.execute(sql).await {
            Ok(_) => Ok(()),
            Err(error) => Err(self.classify(error)),
        }
    }

    /// Classify a statement failure, marking an open transaction rollback-only
    fn record_failure(&mut self, error: DriverError) -> DatabaseError {
        let error = self.classify(error);
        if self.session.is_active() {
            let depth = self.session.depth;
            self.session.mark_rollback_only(depth, &error);
        }
        error
    }

    /// Execute a statement on the coordinated connection
    ///
    /// Inside a transaction, a failure leaves the current level rollback-only
    /// until it is rolled back.
    pub async fn execute(&mut self, sql: &str) -> Result<u64> {
        match self.executor.execute(sql).await {
            Ok(affected) => Ok(affected),
            Err(error) => Err(self.record_failure(error)),
        }
    }

    /// Run a query on the coordinated connection
    pub async fn query(&mut self, sql: &str) -> Result<DatabaseResult> {
        match self.executor.query(sql).await {
            Ok(rows) => Ok(rows),
            Err(error) => Err(self.record_failure(error)),
        }
    }

    /// Begin a transaction, or a savepoint when one is already open
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A nested level is requested and savepoint emulation is disabled or
    ///   unsupported (`UnsupportedNesting`)
    /// - The backend rejects the statement
    pub async fn begin(&mut self) -> Result<()> {
        let depth = self.session.depth;
        if depth == 0 {
            self.issue(self.database_type.begin_transaction_sql()).await?;
            self.session.depth = 1;
            return Ok(());
        }

        if !self.config.nest_with_savepoints {
            return Err(DatabaseError::unsupported_nesting(format!(
                "savepoint emulation is disabled; cannot open nesting level {}",
                depth + 1
            )));
        }
        if !self.capabilities.supports_savepoints {
            return Err(DatabaseError::unsupported_nesting(format!(
                "{} does not support savepoints",
                self.database_type
            )));
        }

        let savepoint = self.config.savepoint_name(depth + 1);
        let sql = self.database_type.create_savepoint_sql(&savepoint);
        self.execute(&sql).await?;
        self.session.push(savepoint);
        Ok(())
    }

    /// Commit the current level
    ///
    /// At the outermost level this issues `COMMIT`, where the backend checks
    /// deferred constraints. A failed `COMMIT` leaves the transaction open and
    /// rollback-only. Nested levels release their savepoint.
    pub async fn commit(&mut self) -> Result<()> {
        if !self.session.is_active() {
            return Err(DatabaseError::no_active_transaction(
                "commit() called without an active transaction",
            ));
        }
        if let Some(marker) = &self.session.rollback_only {
            return Err(marker.to_error(self.database_type));
        }

        if self.session.depth == 1 {
            if !self.session.deferred_constraints.is_empty() {
                tracing::debug!(
                    backend = %self.database_type,
                    deferred = ?self.session.deferred_constraints,
                    "committing with deferred constraints"
                );
            }
            self.execute(self.database_type.commit_sql()).await?;
            self.session.reset();
            return Ok(());
        }

        if self.capabilities.supports_release_savepoints {
            let release_sql = self
                .session
                .savepoints
                .last()
                .and_then(|savepoint| self.database_type.release_savepoint_sql(savepoint));
            if let Some(sql) = release_sql {
                self.execute(&sql).await?;
            }
        }
        self.session.pop();
        Ok(())
    }

    /// Roll back the current level
    ///
    /// The outermost rollback always returns the session to idle. A nested
    /// rollback returns to its savepoint and leaves the outer transaction
    /// active; if that fails, the configured [`SavepointFailurePolicy`]
    /// applies.
    pub async fn rollback(&mut self) -> Result<()> {
        if !self.session.is_active() {
            return Err(DatabaseError::no_active_transaction(
                "rollback() called without an active transaction",
            ));
        }

        let depth = self.session.depth;
        if depth == 1 {
            let result = self.issue(self.database_type.rollback_sql()).await;
            self.session.reset();
            if let Err(error) = &result {
                tracing::warn!(backend = %self.database_type, %error, "rollback failed");
            }
            return result;
        }

        let savepoint = self
            .session
            .savepoints
            .last()
            .cloned()
            .unwrap_or_else(|| self.config.savepoint_name(depth));
        let sql = self.database_type.rollback_savepoint_sql(&savepoint);

        let error = match self.issue(&sql).await {
            Ok(()) => {
                self.session.pop();
                self.session.clear_rollback_only_from(depth);
                return Ok(());
            }
            Err(error) => error,
        };

        tracing::warn!(
            backend = %self.database_type,
            savepoint = %savepoint,
            policy = ?self.config.savepoint_failure_policy,
            %error,
            "rollback to savepoint failed"
        );
        match self.config.savepoint_failure_policy {
            SavepointFailurePolicy::MarkRollbackOnly => {
                self.session.pop();
                self.session.mark_rollback_only(1, &error);
                Err(error)
            }
            SavepointFailurePolicy::RollbackOuter => {
                let outer = self.issue(self.database_type.rollback_sql()).await;
                self.session.reset();
                match outer {
                    Ok(()) => Err(error),
                    Err(rollback_error) => Err(error.with_rollback_failure(rollback_error)),
                }
            }
        }
    }

    /// Run `work` inside a transaction
    ///
    /// Commits when `work` succeeds. When `work` or the commit fails, every
    /// level opened since this call is rolled back and the original error is
    /// returned; a failing rollback is attached to it as the cause.
    pub async fn run_in_transaction<F, T>(&mut self, work: F) -> Result<T>
    where
        F: for<'a> FnOnce(&'a mut Self) -> WorkFuture<'a, T>,
    {
        let base_depth = self.session.depth;
        self.begin().await?;

        let error = match work(&mut *self).await {
            Ok(value) => match self.commit().await {
                Ok(()) => return Ok(value),
                Err(error) => error,
            },
            Err(error) => error,
        };

        let mut error = error;
        while self.session.depth > base_depth {
            if let Err(rollback_error) = self.rollback().await {
                tracing::warn!(
                    backend = %self.database_type,
                    %rollback_error,
                    "rollback after failed transactional work failed"
                );
                error = error.with_rollback_failure(rollback_error);
                break;
            }
        }
        Err(error)
    }

    fn constraint_mode_sql(&self, constraint: Option<&str>, deferred: bool) -> Result<String> {
        let action = match (constraint, deferred) {
            (Some(name), true) => format!("defer constraint \"{}\"", name),
            (Some(name), false) => format!("make constraint \"{}\" immediate", name),
            (None, _) => "defer all constraints".to_string(),
        };
        if !self.capabilities.supports_deferrable_constraints {
            return Err(DatabaseError::capability(format!(
                "{} does not support deferrable constraints; cannot {}",
                self.database_type, action
            )));
        }
        if !self.session.is_active() {
            return Err(DatabaseError::no_active_transaction(format!(
                "cannot {} outside a transaction",
                action
            )));
        }

        let sql = match constraint {
            Some(name) => self.database_type.set_constraint_mode_sql(name, deferred),
            None => self
                .database_type
                .defer_all_constraints_sql()
                .map(str::to_string),
        };
        sql.ok_or_else(|| {
            DatabaseError::capability(format!(
                "{} has no statement to {}",
                self.database_type, action
            ))
        })
    }

    /// Defer checking of a deferrable constraint until the outermost commit
    ///
    /// # Errors
    ///
    /// - `Capability` if the backend has no deferrable constraints; nothing
    ///   is issued
    /// - `NoActiveTransaction` outside a transaction
    pub async fn set_constraint_deferred(&mut self, constraint: &str) -> Result<()> {
        let sql = self.constraint_mode_sql(Some(constraint), true)?;
        self.execute(&sql).await?;
        self.session
            .deferred_constraints
            .insert(constraint.to_string());
        Ok(())
    }

    /// Switch a constraint back to immediate checking
    ///
    /// The backend checks pending rows right away, so a violation surfaces
    /// from this call.
    pub async fn set_constraint_immediate(&mut self, constraint: &str) -> Result<()> {
        let sql = self.constraint_mode_sql(Some(constraint), false)?;
        self.execute(&sql).await?;
        self.session.deferred_constraints.remove(constraint);
        Ok(())
    }

    /// Defer every deferrable constraint until the outermost commit
    pub async fn set_all_constraints_deferred(&mut self) -> Result<()> {
        let sql = self.constraint_mode_sql(None, true)?;
        self.execute(&sql).await?;
        self.session.deferred_constraints.insert("ALL".to_string());
        Ok(())
    }
}

impl<E: StatementExecutor> Drop for TransactionCoordinator<E> {
    fn drop(&mut self) {
        if self.session.is_active() {
            tracing::warn!(
                backend = %self.database_type,
                depth = self.session.depth,
                "TransactionCoordinator dropped with an open transaction; \
                 the backend discards it when the connection closes"
            );
        }
    }
}
