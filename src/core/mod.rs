//! Core types and traits
//!
//! This module provides the building blocks shared by every backend: the
//! error taxonomy and its classifier, backend capabilities and SQL fragments,
//! the statement executor boundary, and the transaction coordinator.

pub mod capabilities;
pub mod classifier;
pub mod database_types;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod transaction;
pub mod value;

// Re-export commonly used types
pub use capabilities::{BackendCapabilities, NameCasing};
pub use classifier::{classify, classify_driver_error, classify_kind};
pub use database_types::DatabaseType;
pub use error::{ClassifiedError, DatabaseError, DriverError, DriverResult, ErrorKind, Result};
pub use executor::StatementExecutor;
pub use transaction::{
    SavepointFailurePolicy, TransactionConfig, TransactionCoordinator, TransactionSession,
    TransactionState, WorkFuture,
};
pub use value::{DatabaseResult, DatabaseRow, DatabaseValue};
