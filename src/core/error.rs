//! Error types for the database core
//!
//! Every failure that crosses the crate boundary is a [`DatabaseError`] whose
//! [`kind`](DatabaseError::kind) is one of the ten [`ErrorKind`] values.
//! Driver failures are normalized into a [`ClassifiedError`] that keeps the
//! raw [`DriverError`] as its source.

use super::database_types::DatabaseType;
use serde::{Deserialize, Serialize};

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Result type alias for raw executor calls
pub type DriverResult<T> = std::result::Result<T, DriverError>;

/// The portable error taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    UniqueConstraintViolation,
    NotNullViolation,
    ForeignKeyViolation,
    DeadlockOrLockTimeout,
    SyntaxError,
    ConnectionError,
    UnsupportedNesting,
    Capability,
    NoActiveTransaction,
    UnknownDriverError,
}

impl ErrorKind {
    /// Stable name of the kind
    pub fn to_str(&self) -> &'static str {
        match self {
            ErrorKind::UniqueConstraintViolation => "unique constraint violation",
            ErrorKind::NotNullViolation => "not null violation",
            ErrorKind::ForeignKeyViolation => "foreign key violation",
            ErrorKind::DeadlockOrLockTimeout => "deadlock or lock timeout",
            ErrorKind::SyntaxError => "syntax error",
            ErrorKind::ConnectionError => "connection error",
            ErrorKind::UnsupportedNesting => "unsupported nesting",
            ErrorKind::Capability => "capability error",
            ErrorKind::NoActiveTransaction => "no active transaction",
            ErrorKind::UnknownDriverError => "unknown driver error",
        }
    }

    /// Whether this kind is produced by classifying a driver error
    pub fn is_driver_kind(&self) -> bool {
        !matches!(
            self,
            ErrorKind::UnsupportedNesting | ErrorKind::Capability | ErrorKind::NoActiveTransaction
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// A raw, backend-specific error as reported by a statement executor
#[derive(Debug, thiserror::Error)]
#[error("driver error [{code}]: {message}")]
pub struct DriverError {
    code: String,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl DriverError {
    /// Create a driver error from a code (SQLSTATE, error number, or empty) and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attach the native driver error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Raw code as reported by the driver
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Raw message as reported by the driver
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A driver error normalized into the portable taxonomy
#[derive(Debug, thiserror::Error)]
#[error("{kind} ({backend}) [{raw_code}]: {raw_message}")]
pub struct ClassifiedError {
    kind: ErrorKind,
    backend: DatabaseType,
    raw_code: String,
    raw_message: String,
    #[source]
    cause: Option<DriverError>,
}

impl ClassifiedError {
    pub(crate) fn new(
        kind: ErrorKind,
        backend: DatabaseType,
        raw_code: impl Into<String>,
        raw_message: impl Into<String>,
        cause: Option<DriverError>,
    ) -> Self {
        debug_assert!(kind.is_driver_kind());
        Self {
            kind,
            backend,
            raw_code: raw_code.into(),
            raw_message: raw_message.into(),
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn backend(&self) -> DatabaseType {
        self.backend
    }

    pub fn raw_code(&self) -> &str {
        &self.raw_code
    }

    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// The raw driver error this classification was derived from
    pub fn cause(&self) -> Option<&DriverError> {
        self.cause.as_ref()
    }
}

/// Error types for core operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// A classified driver failure
    #[error(transparent)]
    Driver(#[from] ClassifiedError),

    /// A nested `begin()` the backend or configuration cannot emulate
    #[error("Nested transactions are not supported: {0}")]
    UnsupportedNesting(String),

    /// An operation the backend capability descriptor rules out
    #[error("Capability error: {0}")]
    Capability(String),

    /// `commit()`/`rollback()` (or a transactional operation) outside a transaction
    #[error("No active transaction: {0}")]
    NoActiveTransaction(String),

    /// The primary error, with the failure of the cleanup rollback as its cause
    #[error("{error}")]
    WithRollbackFailure {
        error: Box<DatabaseError>,
        #[source]
        rollback_error: Box<DatabaseError>,
    },
}

impl DatabaseError {
    /// Create an unsupported nesting error
    pub fn unsupported_nesting<S: Into<String>>(msg: S) -> Self {
        DatabaseError::UnsupportedNesting(msg.into())
    }

    /// Create a capability error
    pub fn capability<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Capability(msg.into())
    }

    /// Create a no-active-transaction error
    pub fn no_active_transaction<S: Into<String>>(msg: S) -> Self {
        DatabaseError::NoActiveTransaction(msg.into())
    }

    /// Attach a failed cleanup rollback to this error
    pub fn with_rollback_failure(self, rollback_error: DatabaseError) -> Self {
        DatabaseError::WithRollbackFailure {
            error: Box::new(self),
            rollback_error: Box::new(rollback_error),
        }
    }

    /// Kind of the primary failure
    pub fn kind(&self) -> ErrorKind {
        match self {
            DatabaseError::Driver(classified) => classified.kind(),
            DatabaseError::UnsupportedNesting(_) => ErrorKind::UnsupportedNesting,
            DatabaseError::Capability(_) => ErrorKind::Capability,
            DatabaseError::NoActiveTransaction(_) => ErrorKind::NoActiveTransaction,
            DatabaseError::WithRollbackFailure { error, .. } => error.kind(),
        }
    }

    /// The classified driver error behind the primary failure, if any
    pub fn classified(&self) -> Option<&ClassifiedError> {
        match self {
            DatabaseError::Driver(classified) => Some(classified),
            DatabaseError::WithRollbackFailure { error, .. } => error.classified(),
            _ => None,
        }
    }

    /// The cleanup rollback failure chained onto this error, if any
    pub fn rollback_error(&self) -> Option<&DatabaseError> {
        match self {
            DatabaseError::WithRollbackFailure { rollback_error, .. } => Some(rollback_error),
            _ => None,
        }
    }
}
