//! Backend capability descriptors
//!
//! Static, per-backend facts the transaction coordinator and the constraint
//! introspector dispatch on instead of branching on concrete backend types.

use super::database_types::DatabaseType;
use serde::{Deserialize, Serialize};

/// How a backend folds unquoted identifiers, and therefore constraint names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameCasing {
    /// Names are kept exactly as written
    #[default]
    AsDeclared,
    /// Unquoted names fold to upper case (Oracle)
    Upper,
    /// Unquoted names fold to lower case (PostgreSQL)
    Lower,
}

impl NameCasing {
    /// Normalize a name according to this convention
    pub fn normalize(&self, name: &str) -> String {
        match self {
            NameCasing::AsDeclared => name.to_string(),
            NameCasing::Upper => name.to_uppercase(),
            NameCasing::Lower => name.to_lowercase(),
        }
    }

    /// Compare two names after normalizing both
    pub fn names_equal(&self, left: &str, right: &str) -> bool {
        match self {
            NameCasing::AsDeclared => left == right,
            _ => self.normalize(left) == self.normalize(right),
        }
    }

    /// Resolve an identifier as the backend would store it.
    ///
    /// A name wrapped in double quotes is taken verbatim (with doubled quotes
    /// unescaped); anything else is folded.
    pub fn resolve_identifier(&self, name: &str) -> String {
        let trimmed = name.trim();
        if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
            return trimmed[1..trimmed.len() - 1].replace("\"\"", "\"");
        }
        self.normalize(trimmed)
    }
}

/// Immutable capability descriptor for one backend identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendCapabilities {
    /// `SAVEPOINT` (or an equivalent) is available inside a transaction
    pub supports_savepoints: bool,
    /// Savepoints can be released explicitly before the outer commit
    pub supports_release_savepoints: bool,
    /// Constraints can be declared deferrable and deferred per transaction
    pub supports_deferrable_constraints: bool,
    /// Casing convention for constraint names
    pub constraint_name_casing: NameCasing,
}

impl BackendCapabilities {
    /// Descriptor for the given backend
    pub const fn for_backend(db_type: DatabaseType) -> Self {
        match db_type {
            DatabaseType::Postgres => Self {
                supports_savepoints: true,
                supports_release_savepoints: true,
                supports_deferrable_constraints: true,
                constraint_name_casing: NameCasing::Lower,
            },
            DatabaseType::Mysql | DatabaseType::Sqlite => Self {
                supports_savepoints: true,
                supports_release_savepoints: true,
                supports_deferrable_constraints: false,
                constraint_name_casing: NameCasing::AsDeclared,
            },
            DatabaseType::Oracle => Self {
                supports_savepoints: true,
                supports_release_savepoints: false,
                supports_deferrable_constraints: true,
                constraint_name_casing: NameCasing::Upper,
            },
            DatabaseType::SqlServer => Self {
                supports_savepoints: true,
                supports_release_savepoints: false,
                supports_deferrable_constraints: false,
                constraint_name_casing: NameCasing::AsDeclared,
            },
        }
    }

    /// Disable savepoint support
    pub fn without_savepoints(mut self) -> Self {
        self.supports_savepoints = false;
        self.supports_release_savepoints = false;
        self
    }

    /// Override deferrable-constraint support
    pub fn with_deferrable_constraints(mut self, supported: bool) -> Self {
        self.supports_deferrable_constraints = supported;
        self
    }
}
