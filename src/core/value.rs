//! Database value types
//!
//! Values returned by catalog queries. The core only reads names, positions
//! and flags, so the set of variants is deliberately small.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Database value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatabaseValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit integer
    Long(i64),
    /// 64-bit floating point
    Double(f64),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
}

impl DatabaseValue {
    /// Get the value as a boolean.
    ///
    /// Understands the spellings catalogs use for flags: `t`/`f`, `YES`/`NO`,
    /// `Y`/`N`, `1`/`0`, and Oracle's `DEFERRABLE`/`DEFERRED`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(v) => Some(*v),
            DatabaseValue::Long(v) => Some(*v != 0),
            DatabaseValue::String(s) => match s.trim().to_uppercase().as_str() {
                "T" | "TRUE" | "Y" | "YES" | "1" | "DEFERRABLE" | "DEFERRED" => Some(true),
                "F" | "FALSE" | "N" | "NO" | "0" | "NOT DEFERRABLE" | "IMMEDIATE" => {
                    Some(false)
                }
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i64
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Long(v) => Some(*v),
            DatabaseValue::Double(v) => Some(*v as i64),
            DatabaseValue::String(s) => s.trim().parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as a string, `None` for NULL and binary data
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Render the value as a string (NULL renders as empty)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => String::new(),
            DatabaseValue::Bool(v) => v.to_string(),
            DatabaseValue::Long(v) => v.to_string(),
            DatabaseValue::Double(v) => v.to_string(),
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Bytes(b) => String::from_utf8_lossy(b).into_owned(),
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }
}

impl From<bool> for DatabaseValue {
    fn from(v: bool) -> Self {
        DatabaseValue::Bool(v)
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Long(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::String(v.to_string())
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::String(v)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// A row of results (column name -> value)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatabaseRow {
    values: HashMap<String, DatabaseValue>,
}

impl DatabaseRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<DatabaseValue>) {
        self.values.insert(column.into(), value.into());
    }

    /// Look a column up by name.
    ///
    /// Falls back to an ASCII case-insensitive match, since catalogs disagree
    /// on the case of their result column labels.
    pub fn get(&self, column: &str) -> Option<&DatabaseValue> {
        self.values.get(column).or_else(|| {
            self.values
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, value)| value)
        })
    }

    /// Non-null string value of a column
    pub fn get_string(&self, column: &str) -> Option<String> {
        self.get(column)
            .filter(|value| !value.is_null())
            .map(DatabaseValue::as_string)
    }

    /// Boolean flag of a column, `false` when absent or unrecognized
    pub fn get_flag(&self, column: &str) -> bool {
        self.get(column)
            .and_then(DatabaseValue::as_bool)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<DatabaseValue>> FromIterator<(K, V)> for DatabaseRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = DatabaseRow::new();
        for (column, value) in iter {
            row.insert(column, value);
        }
        row
    }
}

/// Multiple rows returned from a query
pub type DatabaseResult = Vec<DatabaseRow>;
