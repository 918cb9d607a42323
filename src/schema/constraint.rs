//! Introspected constraint types

use crate::core::capabilities::NameCasing;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

fn valid_columns(columns: &[String]) -> bool {
    let mut seen = HashSet::with_capacity(columns.len());
    !columns.is_empty()
        && columns
            .iter()
            .all(|column| !column.is_empty() && seen.insert(column.as_str()))
}

/// A unique constraint as reported by the catalog
///
/// Columns are non-empty, duplicate-free and in key order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UniqueConstraint {
    name: String,
    columns: Vec<String>,
    deferrable: bool,
    initially_deferred: bool,
}

impl UniqueConstraint {
    /// Create a non-deferrable constraint; `None` if `columns` is empty or repeats a column
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Option<Self> {
        if !valid_columns(&columns) {
            return None;
        }
        Some(Self {
            name: name.into(),
            columns,
            deferrable: false,
            initially_deferred: false,
        })
    }

    /// Set deferrability; `initially_deferred` only holds for a deferrable constraint
    pub fn with_deferral(mut self, deferrable: bool, initially_deferred: bool) -> Self {
        self.deferrable = deferrable;
        self.initially_deferred = deferrable && initially_deferred;
        self
    }

    /// Name exactly as declared
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn is_deferrable(&self) -> bool {
        self.deferrable
    }

    pub fn is_initially_deferred(&self) -> bool {
        self.initially_deferred
    }

    /// Compare the name with `other` under a backend's casing convention
    pub fn name_matches(&self, other: &str, casing: NameCasing) -> bool {
        casing.names_equal(&self.name, other)
    }
}

/// A foreign key constraint as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    name: Option<String>,
    columns: Vec<String>,
    foreign_table: String,
    foreign_columns: Vec<String>,
    deferrable: bool,
    initially_deferred: bool,
}

impl ForeignKeyConstraint {
    /// Create a non-deferrable foreign key.
    ///
    /// `foreign_columns` may be empty when the key references the primary key
    /// implicitly; otherwise it must pair up with `columns`.
    pub fn new(
        name: Option<String>,
        columns: Vec<String>,
        foreign_table: impl Into<String>,
        foreign_columns: Vec<String>,
    ) -> Option<Self> {
        if !valid_columns(&columns)
            || (!foreign_columns.is_empty() && foreign_columns.len() != columns.len())
        {
            return None;
        }
        Some(Self {
            name,
            columns,
            foreign_table: foreign_table.into(),
            foreign_columns,
            deferrable: false,
            initially_deferred: false,
        })
    }

    pub fn with_deferral(mut self, deferrable: bool, initially_deferred: bool) -> Self {
        self.deferrable = deferrable;
        self.initially_deferred = deferrable && initially_deferred;
        self
    }

    /// Declared name; SQLite keeps none for unnamed keys
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn foreign_table(&self) -> &str {
        &self.foreign_table
    }

    pub fn foreign_columns(&self) -> &[String] {
        &self.foreign_columns
    }

    pub fn is_deferrable(&self) -> bool {
        self.deferrable
    }

    pub fn is_initially_deferred(&self) -> bool {
        self.initially_deferred
    }

    pub fn name_matches(&self, other: &str, casing: NameCasing) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| casing.names_equal(name, other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_unique_constraint_columns() {
        assert!(UniqueConstraint::new("u", cols(&["a", "b"])).is_some());
        assert!(UniqueConstraint::new("u", Vec::new()).is_none());
        assert!(UniqueConstraint::new("u", cols(&["a", "a"])).is_none());
        assert!(UniqueConstraint::new("u", cols(&[""])).is_none());
    }

    #[test]
    fn test_initially_deferred_requires_deferrable() {
        let uc = UniqueConstraint::new("u", cols(&["a"]))
            .map(|uc| uc.with_deferral(false, true));
        assert_eq!(uc.map(|uc| uc.is_initially_deferred()), Some(false));
    }

    #[test]
    fn test_name_matches_per_casing() {
        let uc = UniqueConstraint::new("UNIQ_EMAIL", cols(&["EMAIL"])).expect("valid");
        assert!(uc.name_matches("uniq_email", NameCasing::Upper));
        assert!(!uc.name_matches("uniq_email", NameCasing::AsDeclared));
        assert!(uc.name_matches("UNIQ_EMAIL", NameCasing::AsDeclared));
    }

    #[test]
    fn test_foreign_key_pairs_columns() {
        assert!(ForeignKeyConstraint::new(None, cols(&["a"]), "p", Vec::new()).is_some());
        assert!(ForeignKeyConstraint::new(None, cols(&["a"]), "p", cols(&["id"])).is_some());
        assert!(ForeignKeyConstraint::new(None, cols(&["a", "b"]), "p", cols(&["id"])).is_none());

        let fk = ForeignKeyConstraint::new(Some("fk".into()), cols(&["a"]), "p", cols(&["id"]))
            .expect("valid")
            .with_deferral(true, true);
        assert!(fk.is_deferrable());
        assert!(fk.is_initially_deferred());
        assert!(fk.name_matches("FK", NameCasing::Lower));
    }
}
