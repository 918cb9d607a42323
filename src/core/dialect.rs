//! Backend-specific SQL fragments
//!
//! The core only formats transaction-control and constraint-deferral
//! statements; everything else is left to the statement executor.

use super::database_types::DatabaseType;

impl DatabaseType {
    /// Statement that opens an outermost transaction
    pub fn begin_transaction_sql(&self) -> &'static str {
        match self {
            DatabaseType::Postgres | DatabaseType::Sqlite => "BEGIN",
            DatabaseType::Mysql => "START TRANSACTION",
            DatabaseType::Oracle => "SET TRANSACTION READ WRITE",
            DatabaseType::SqlServer => "BEGIN TRANSACTION",
        }
    }

    /// Statement that commits the outermost transaction
    pub fn commit_sql(&self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "COMMIT TRANSACTION",
            _ => "COMMIT",
        }
    }

    /// Statement that rolls back the outermost transaction
    pub fn rollback_sql(&self) -> &'static str {
        match self {
            DatabaseType::SqlServer => "ROLLBACK TRANSACTION",
            _ => "ROLLBACK",
        }
    }

    /// Statement that creates a savepoint
    pub fn create_savepoint_sql(&self, savepoint: &str) -> String {
        match self {
            DatabaseType::SqlServer => format!("SAVE TRANSACTION {}", savepoint),
            _ => format!("SAVEPOINT {}", savepoint),
        }
    }

    /// Statement that releases a savepoint, if the backend has one
    pub fn release_savepoint_sql(&self, savepoint: &str) -> Option<String> {
        match self {
            DatabaseType::Oracle | DatabaseType::SqlServer => None,
            _ => Some(format!("RELEASE SAVEPOINT {}", savepoint)),
        }
    }

    /// Statement that rolls back to a savepoint
    pub fn rollback_savepoint_sql(&self, savepoint: &str) -> String {
        match self {
            DatabaseType::SqlServer => format!("ROLLBACK TRANSACTION {}", savepoint),
            _ => format!("ROLLBACK TO SAVEPOINT {}", savepoint),
        }
    }

    /// Statement that switches a named constraint to deferred or immediate checking.
    ///
    /// Returns `None` for backends without deferrable constraints.
    pub fn set_constraint_mode_sql(&self, constraint: &str, deferred: bool) -> Option<String> {
        let mode = if deferred { "DEFERRED" } else { "IMMEDIATE" };
        match self {
            DatabaseType::Postgres => Some(format!(
                "SET CONSTRAINTS {} {}",
                self.quote_identifier(constraint),
                mode
            )),
            DatabaseType::Oracle => Some(format!(
                "SET CONSTRAINT {} {}",
                self.quote_identifier(constraint),
                mode
            )),
            _ => None,
        }
    }

    /// Statement that defers every deferrable constraint
    pub fn defer_all_constraints_sql(&self) -> Option<&'static str> {
        match self {
            DatabaseType::Postgres | DatabaseType::Oracle => Some("SET CONSTRAINTS ALL DEFERRED"),
            _ => None,
        }
    }

    /// Quote an identifier, doubling any embedded closing quote
    pub fn quote_identifier(&self, name: &str) -> String {
        match self {
            DatabaseType::Mysql => format!("`{}`", name.replace('`', "``")),
            DatabaseType::SqlServer => format!("[{}]", name.replace(']', "]]")),
            _ => format!("\"{}\"", name.replace('"', "\"\"")),
        }
    }

    /// Quote a string literal for a catalog query
    pub fn quote_literal(&self, value: &str) -> String {
        let escaped = value.replace('\'', "''");
        match self {
            DatabaseType::Mysql => format!("'{}'", escaped.replace('\\', "\\\\")),
            DatabaseType::SqlServer => format!("N'{}'", escaped),
            _ => format!("'{}'", escaped),
        }
    }
}
