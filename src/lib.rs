//! # Rust Database Core
//!
//! Portable transaction coordination, driver error classification and schema
//! introspection for relational database backends.
//!
//! The crate sits between application code and a driver. It formats the
//! transaction-control statements each backend expects, turns nested
//! transactions into savepoints, folds every driver failure into a small
//! [`ErrorKind`] taxonomy, and recovers constraint and column metadata from
//! system catalogs and stored `CREATE TABLE` text.
//!
//! ## Features
//!
//! - **Nested Transactions**: Savepoint emulation with per-backend dialects
//! - **Rollback-Only Tracking**: A failed statement poisons the enclosing transaction
//! - **Deferred Constraints**: Per-constraint and session-wide deferral where supported
//! - **Error Classification**: SQLSTATE and vendor codes mapped to one taxonomy
//! - **Schema Introspection**: Unique and foreign key constraints, collations and comments
//! - **Async Support**: Async/await support with Tokio
//!
//! ## Supported Databases
//!
//! | Database | Executor | Savepoints | Deferrable constraints |
//! |----------|----------|------------|------------------------|
//! | SQLite | `SqliteExecutor` (bundled) | yes | declared only, no `SET CONSTRAINTS` |
//! | PostgreSQL | `PostgresExecutor` (feature `postgres`) | yes | yes |
//! | MySQL | bring your own | yes | no |
//! | Oracle | bring your own | yes, no release | yes |
//! | SQL Server | bring your own | yes, no release | no |
//!
//! Any driver can be plugged in by implementing [`StatementExecutor`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_database_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let db = SqliteExecutor::open(":memory:").await?;
//!     let mut tx = TransactionCoordinator::new(db);
//!
//!     tx.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, email TEXT UNIQUE)").await?;
//!
//!     tx.begin().await?;
//!     tx.execute("INSERT INTO users (email) VALUES ('a@example.com')").await?;
//!
//!     // Nested level: becomes a savepoint
//!     tx.begin().await?;
//!     if let Err(e) = tx.execute("INSERT INTO users (email) VALUES ('a@example.com')").await {
//!         assert_eq!(e.kind(), ErrorKind::UniqueConstraintViolation);
//!         tx.rollback().await?;
//!     }
//!
//!     tx.commit().await?;
//!
//!     let constraints = tx.introspector().list_unique_constraints("users", None).await?;
//!     println!("{:?}", constraints);
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! src/
//! ├── core/              # Errors, classifier, capabilities, coordinator
//! ├── schema/            # DDL parser, constraint types, introspector
//! ├── backends/          # SQLite and PostgreSQL executors
//! └── lib.rs
//! ```

/// Core types, error classification and transaction coordination
pub mod core;

/// Schema metadata parsing and introspection
pub mod schema;

/// Statement executor implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_database_core::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let db = SqliteExecutor::open(":memory:").await?;
///     let tx = TransactionCoordinator::new(db);
///     assert!(!tx.is_active());
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::core::{
        classify, BackendCapabilities, DatabaseError, DatabaseResult, DatabaseRow, DatabaseType,
        DatabaseValue, ErrorKind, Result, SavepointFailurePolicy, StatementExecutor,
        TransactionConfig, TransactionCoordinator, TransactionState,
    };
    pub use crate::schema::{
        parse_column_metadata, ColumnMetadata, ConstraintIntrospector, ForeignKeyConstraint,
        UniqueConstraint,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteExecutor;
}

// Re-export at root level for convenience
pub use core::{
    classify, BackendCapabilities, ClassifiedError, DatabaseError, DatabaseResult, DatabaseRow,
    DatabaseType, DatabaseValue, DriverError, ErrorKind, Result, StatementExecutor,
    TransactionConfig, TransactionCoordinator,
};
pub use schema::ConstraintIntrospector;

#[cfg(feature = "sqlite")]
pub use backends::SqliteExecutor;
