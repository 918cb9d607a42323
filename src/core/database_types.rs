//! Database type definitions
//!
//! This module defines the relational backends the core knows how to drive.

use super::capabilities::BackendCapabilities;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported backend identities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DatabaseType {
    /// PostgreSQL database
    Postgres = 1,
    /// MySQL/MariaDB database
    Mysql = 2,
    /// SQLite database
    Sqlite = 3,
    /// Oracle database
    Oracle = 4,
    /// Microsoft SQL Server
    SqlServer = 5,
}

impl DatabaseType {
    /// Every backend identity, in declaration order
    pub const ALL: [DatabaseType; 5] = [
        DatabaseType::Postgres,
        DatabaseType::Mysql,
        DatabaseType::Sqlite,
        DatabaseType::Oracle,
        DatabaseType::SqlServer,
    ];

    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "postgres",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Sqlite => "sqlite",
            DatabaseType::Oracle => "oracle",
            DatabaseType::SqlServer => "sqlserver",
        }
    }

    /// Static capability descriptor for this backend
    pub fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::for_backend(*self)
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "pgsql" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::Mysql),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            "oracle" | "oci" => Ok(DatabaseType::Oracle),
            "sqlserver" | "mssql" | "sqlsrv" => Ok(DatabaseType::SqlServer),
            _ => Err(format!("Invalid database type: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_to_str() {
        assert_eq!(DatabaseType::Postgres.to_str(), "postgres");
        assert_eq!(DatabaseType::Mysql.to_str(), "mysql");
        assert_eq!(DatabaseType::Sqlite.to_str(), "sqlite");
        assert_eq!(DatabaseType::Oracle.to_str(), "oracle");
        assert_eq!(DatabaseType::SqlServer.to_str(), "sqlserver");
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!(
            "postgresql".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Postgres)
        );
        assert_eq!(
            "MariaDB".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Mysql)
        );
        assert_eq!(
            "sqlite3".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Sqlite)
        );
        assert_eq!(
            "mssql".parse::<DatabaseType>().ok(),
            Some(DatabaseType::SqlServer)
        );
        assert_eq!("mongodb".parse::<DatabaseType>().ok(), None);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for db_type in DatabaseType::ALL {
            assert_eq!(db_type.to_string().parse::<DatabaseType>(), Ok(db_type));
        }
    }
}
