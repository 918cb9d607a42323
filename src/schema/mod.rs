//! Schema metadata
//!
//! DDL text parsing and catalog-driven constraint introspection.

pub mod constraint;
pub mod ddl;
pub mod introspector;

pub use constraint::{ForeignKeyConstraint, UniqueConstraint};
pub use ddl::{
    extract_type_hint, parse_column_collation, parse_column_comment, parse_column_metadata,
    parse_table_comment, parse_table_constraints, ColumnMetadata, ConstraintDefinition,
    ConstraintKind,
};
pub use introspector::ConstraintIntrospector;
