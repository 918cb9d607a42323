//! Catalog-driven constraint introspection
//!
//! [`ConstraintIntrospector`] lists the unique and foreign key constraints of
//! a table by querying each backend's system catalog. SQLite has no
//! constraint catalog, so its index and foreign key pragmas are combined with
//! the stored `CREATE TABLE` text to recover declared names.
//!
//! Every method takes an optional `database` (schema, catalog or attached
//! database, depending on the backend). `None` means the connection's current
//! one; an explicit value is used in every catalog query issued.

use super::constraint::{ForeignKeyConstraint, UniqueConstraint};
use super::ddl::{parse_column_metadata, parse_table_constraints, ColumnMetadata, ConstraintDefinition, ConstraintKind};
use crate::core::capabilities::{BackendCapabilities, NameCasing};
use crate::core::classifier::classify_driver_error;
use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};
use crate::core::executor::StatementExecutor;
use crate::core::transaction::TransactionCoordinator;
use crate::core::value::{DatabaseResult, DatabaseRow, DatabaseValue};
use std::collections::BTreeMap;

/// Lists constraints through a statement executor
pub struct ConstraintIntrospector<'a, E: StatementExecutor + ?Sized> {
    executor: &'a E,
    database_type: DatabaseType,
    casing: NameCasing,
}

impl<'a, E: StatementExecutor + ?Sized> ConstraintIntrospector<'a, E> {
    pub fn new(executor: &'a E) -> Self {
        let database_type = executor.database_type();
        Self {
            executor,
            database_type,
            casing: database_type.capabilities().constraint_name_casing,
        }
    }

    /// Use the name casing of an overridden capability descriptor
    pub fn with_capabilities(mut self, capabilities: &BackendCapabilities) -> Self {
        self.casing = capabilities.constraint_name_casing;
        self
    }

    pub fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    pub fn name_casing(&self) -> NameCasing {
        self.casing
    }

    async fn fetch(&self, sql: &str) -> Result<DatabaseResult> {
        tracing::debug!(backend = %self.database_type, sql, "running catalog query");
        self.executor
            .query(sql)
            .await
            .map_err(|e| DatabaseError::from(classify_driver_error(e, self.database_type)))
    }

    fn literal(&self, value: &str) -> String {
        self.database_type.quote_literal(value)
    }

    /// Expression naming the schema/catalog to search
    fn schema_expr(&self, database: Option<&str>) -> String {
        match database {
            Some(database) => self.literal(database),
            None => match self.database_type {
                DatabaseType::Postgres => "current_schema()".to_string(),
                DatabaseType::Mysql => "DATABASE()".to_string(),
                DatabaseType::Sqlite => "'main'".to_string(),
                DatabaseType::Oracle => "SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')".to_string(),
                DatabaseType::SqlServer => "SCHEMA_NAME()".to_string(),
            },
        }
    }

    /// Quoted SQLite schema name (`main` unless overridden)
    fn sqlite_schema(&self, database: Option<&str>) -> String {
        self.database_type
            .quote_identifier(database.unwrap_or("main"))
    }

    /// Unique constraints of `table`, distinct and ordered by name
    ///
    /// Names are returned exactly as the catalog reports them; compare them
    /// with [`UniqueConstraint::name_matches`].
    pub async fn list_unique_constraints(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<UniqueConstraint>> {
        let table = self.casing.resolve_identifier(table);
        let table_lit = self.literal(&table);
        let schema = self.schema_expr(database);

        let sql = match self.database_type {
            DatabaseType::Sqlite => return self.sqlite_unique_constraints(&table, database).await,
            DatabaseType::Postgres => format!(
                "SELECT c.conname AS constraint_name, a.attname AS column_name, k.position AS position, \
                 c.condeferrable AS is_deferrable, c.condeferred AS initially_deferred \
                 FROM pg_constraint c \
                 JOIN pg_class t ON t.oid = c.conrelid \
                 JOIN pg_namespace n ON n.oid = t.relnamespace \
                 CROSS JOIN LATERAL unnest(c.conkey) WITH ORDINALITY AS k(attnum, position) \
                 JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
                 WHERE c.contype = 'u' AND t.relname = {} AND n.nspname = {} \
                 ORDER BY c.conname, k.position",
                table_lit, schema
            ),
            DatabaseType::Mysql => format!(
                "SELECT tc.CONSTRAINT_NAME AS constraint_name, k.COLUMN_NAME AS column_name, \
                 k.ORDINAL_POSITION AS position \
                 FROM information_schema.TABLE_CONSTRAINTS tc \
                 JOIN information_schema.KEY_COLUMN_USAGE k \
                 ON k.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA AND k.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
                 AND k.TABLE_NAME = tc.TABLE_NAME \
                 WHERE tc.CONSTRAINT_TYPE = 'UNIQUE' AND tc.TABLE_SCHEMA = {} AND tc.TABLE_NAME = {} \
                 ORDER BY tc.CONSTRAINT_NAME, k.ORDINAL_POSITION",
                schema, table_lit
            ),
            DatabaseType::Oracle => format!(
                "SELECT c.constraint_name AS constraint_name, cc.column_name AS column_name, \
                 cc.position AS position, c.deferrable AS is_deferrable, c.deferred AS initially_deferred \
                 FROM all_constraints c \
                 JOIN all_cons_columns cc ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
                 AND cc.table_name = c.table_name \
                 WHERE c.constraint_type = 'U' AND c.owner = {} AND c.table_name = {} \
                 ORDER BY c.constraint_name, cc.position",
                schema, table_lit
            ),
            DatabaseType::SqlServer => format!(
                "SELECT kc.name AS constraint_name, col.name AS column_name, ic.key_ordinal AS position \
                 FROM sys.key_constraints kc \
                 JOIN sys.tables t ON t.object_id = kc.parent_object_id \
                 JOIN sys.schemas s ON s.schema_id = t.schema_id \
                 JOIN sys.index_columns ic ON ic.object_id = kc.parent_object_id AND ic.index_id = kc.unique_index_id \
                 JOIN sys.columns col ON col.object_id = ic.object_id AND col.column_id = ic.column_id \
                 WHERE kc.type = 'UQ' AND t.name = {} AND s.name = {} \
                 ORDER BY kc.name, ic.key_ordinal",
                table_lit, schema
            ),
        };

        let rows = self.fetch(&sql).await?;
        Ok(collect_unique_constraints(&rows))
    }

    /// Foreign keys of `table`, ordered by name
    pub async fn list_foreign_keys(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ForeignKeyConstraint>> {
        let table = self.casing.resolve_identifier(table);
        let table_lit = self.literal(&table);
        let schema = self.schema_expr(database);

        let sql = match self.database_type {
            DatabaseType::Sqlite => return self.sqlite_foreign_keys(&table, database).await,
            DatabaseType::Postgres => format!(
                "SELECT c.conname AS constraint_name, a.attname AS column_name, ft.relname AS foreign_table, \
                 fa.attname AS foreign_column, k.position AS position, \
                 c.condeferrable AS is_deferrable, c.condeferred AS initially_deferred \
                 FROM pg_constraint c \
                 JOIN pg_class t ON t.oid = c.conrelid \
                 JOIN pg_namespace n ON n.oid = t.relnamespace \
                 JOIN pg_class ft ON ft.oid = c.confrelid \
                 CROSS JOIN LATERAL unnest(c.conkey, c.confkey) WITH ORDINALITY AS k(attnum, fattnum, position) \
                 JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = k.attnum \
                 JOIN pg_attribute fa ON fa.attrelid = ft.oid AND fa.attnum = k.fattnum \
                 WHERE c.contype = 'f' AND t.relname = {} AND n.nspname = {} \
                 ORDER BY c.conname, k.position",
                table_lit, schema
            ),
            DatabaseType::Mysql => format!(
                "SELECT k.CONSTRAINT_NAME AS constraint_name, k.COLUMN_NAME AS column_name, \
                 k.REFERENCED_TABLE_NAME AS foreign_table, k.REFERENCED_COLUMN_NAME AS foreign_column, \
                 k.ORDINAL_POSITION AS position \
                 FROM information_schema.KEY_COLUMN_USAGE k \
                 JOIN information_schema.TABLE_CONSTRAINTS tc \
                 ON tc.CONSTRAINT_SCHEMA = k.CONSTRAINT_SCHEMA AND tc.CONSTRAINT_NAME = k.CONSTRAINT_NAME \
                 AND tc.TABLE_NAME = k.TABLE_NAME \
                 WHERE tc.CONSTRAINT_TYPE = 'FOREIGN KEY' AND k.TABLE_SCHEMA = {} AND k.TABLE_NAME = {} \
                 ORDER BY k.CONSTRAINT_NAME, k.ORDINAL_POSITION",
                schema, table_lit
            ),
            DatabaseType::Oracle => format!(
                "SELECT c.constraint_name AS constraint_name, cc.column_name AS column_name, \
                 r.table_name AS foreign_table, rc.column_name AS foreign_column, cc.position AS position, \
                 c.deferrable AS is_deferrable, c.deferred AS initially_deferred \
                 FROM all_constraints c \
                 JOIN all_cons_columns cc ON cc.owner = c.owner AND cc.constraint_name = c.constraint_name \
                 JOIN all_constraints r ON r.owner = c.r_owner AND r.constraint_name = c.r_constraint_name \
                 JOIN all_cons_columns rc ON rc.owner = r.owner AND rc.constraint_name = r.constraint_name \
                 AND rc.position = cc.position \
                 WHERE c.constraint_type = 'R' AND c.owner = {} AND c.table_name = {} \
                 ORDER BY c.constraint_name, cc.position",
                schema, table_lit
            ),
            DatabaseType::SqlServer => format!(
                "SELECT fk.name AS constraint_name, pc.name AS column_name, rt.name AS foreign_table, \
                 rc.name AS foreign_column, fkc.constraint_column_id AS position \
                 FROM sys.foreign_keys fk \
                 JOIN sys.tables t ON t.object_id = fk.parent_object_id \
                 JOIN sys.schemas s ON s.schema_id = t.schema_id \
                 JOIN sys.tables rt ON rt.object_id = fk.referenced_object_id \
                 JOIN sys.foreign_key_columns fkc ON fkc.constraint_object_id = fk.object_id \
                 JOIN sys.columns pc ON pc.object_id = fkc.parent_object_id AND pc.column_id = fkc.parent_column_id \
                 JOIN sys.columns rc ON rc.object_id = fkc.referenced_object_id AND rc.column_id = fkc.referenced_column_id \
                 WHERE t.name = {} AND s.name = {} \
                 ORDER BY fk.name, fkc.constraint_column_id",
                table_lit, schema
            ),
        };

        let rows = self.fetch(&sql).await?;
        Ok(collect_foreign_keys(&rows))
    }

    /// The `CREATE TABLE` text of `table`, or `None` if the table doesn't exist
    ///
    /// # Errors
    ///
    /// `Capability` on PostgreSQL and SQL Server, which keep no DDL text.
    pub async fn table_ddl(&self, table: &str, database: Option<&str>) -> Result<Option<String>> {
        let table = self.casing.resolve_identifier(table);
        let (sql, column) = match self.database_type {
            DatabaseType::Sqlite => (
                format!(
                    "SELECT sql FROM {}.sqlite_master WHERE type = 'table' AND name = {}",
                    self.sqlite_schema(database),
                    self.literal(&table)
                ),
                "sql",
            ),
            DatabaseType::Mysql => {
                let qualified = match database {
                    Some(database) => format!(
                        "{}.{}",
                        self.database_type.quote_identifier(database),
                        self.database_type.quote_identifier(&table)
                    ),
                    None => self.database_type.quote_identifier(&table),
                };
                (format!("SHOW CREATE TABLE {}", qualified), "Create Table")
            }
            DatabaseType::Oracle => (
                format!(
                    "SELECT DBMS_METADATA.GET_DDL('TABLE', {}, {}) AS ddl FROM DUAL",
                    self.literal(&table),
                    self.schema_expr(database)
                ),
                "ddl",
            ),
            DatabaseType::Postgres | DatabaseType::SqlServer => {
                return Err(DatabaseError::capability(format!(
                    "{} does not store table DDL text",
                    self.database_type
                )))
            }
        };

        let rows = self.fetch(&sql).await?;
        Ok(rows.first().and_then(|row| row.get_string(column)))
    }

    /// Collation and comment of a column, recovered from the table's DDL
    pub async fn column_metadata(
        &self,
        table: &str,
        column: &str,
        database: Option<&str>,
    ) -> Result<Option<ColumnMetadata>> {
        let ddl = self.table_ddl(table, database).await?;
        Ok(ddl.and_then(|ddl| parse_column_metadata(column, &ddl)))
    }

    async fn sqlite_declared_constraints(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ConstraintDefinition>> {
        let ddl = self.table_ddl(table, database).await?;
        Ok(ddl
            .as_deref()
            .map(parse_table_constraints)
            .unwrap_or_default())
    }

    async fn sqlite_unique_constraints(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<UniqueConstraint>> {
        let schema = self.sqlite_schema(database);
        let declared = self.sqlite_declared_constraints(table, database).await?;
        let indexes = self
            .fetch(&format!("PRAGMA {}.index_list({})", schema, self.literal(table)))
            .await?;

        let mut constraints = Vec::new();
        for index in &indexes {
            // origin 'u' marks indexes backing UNIQUE constraints
            if index.get_string("origin").as_deref() != Some("u") {
                continue;
            }
            let Some(index_name) = index.get_string("name") else {
                continue;
            };

            let info = self
                .fetch(&format!(
                    "PRAGMA {}.index_info({})",
                    schema,
                    self.literal(&index_name)
                ))
                .await?;
            let mut keyed: Vec<(i64, String)> = info
                .iter()
                .filter_map(|row| Some((position(row, 0), row.get_string("name")?)))
                .collect();
            keyed.sort_by_key(|(seqno, _)| *seqno);
            let columns: Vec<String> = keyed.into_iter().map(|(_, column)| column).collect();

            let declaration = declared.iter().find(|definition| {
                definition.kind == ConstraintKind::Unique && same_columns(&definition.columns, &columns)
            });
            let name = declaration
                .and_then(|definition| definition.name.clone())
                .unwrap_or(index_name);
            let (deferrable, initially_deferred) = declaration
                .map_or((false, false), |d| (d.deferrable, d.initially_deferred));

            match UniqueConstraint::new(name, columns) {
                Some(constraint) => {
                    constraints.push(constraint.with_deferral(deferrable, initially_deferred))
                }
                None => tracing::warn!(table, "skipping unique index without usable columns"),
            }
        }

        constraints.sort();
        constraints.dedup();
        Ok(constraints)
    }

    async fn sqlite_foreign_keys(
        &self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ForeignKeyConstraint>> {
        let schema = self.sqlite_schema(database);
        let declared = self.sqlite_declared_constraints(table, database).await?;
        let rows = self
            .fetch(&format!(
                "PRAGMA {}.foreign_key_list({})",
                schema,
                self.literal(table)
            ))
            .await?;

        // id -> (referenced table, (seq, from, to))
        let mut grouped: BTreeMap<i64, (String, Vec<(i64, String, Option<String>)>)> = BTreeMap::new();
        for row in &rows {
            let (Some(from), Some(foreign_table)) = (row.get_string("from"), row.get_string("table"))
            else {
                continue;
            };
            let id = row.get("id").and_then(DatabaseValue::as_long).unwrap_or(0);
            grouped
                .entry(id)
                .or_insert_with(|| (foreign_table, Vec::new()))
                .1
                .push((position(row, 0), from, row.get_string("to")));
        }

        let mut foreign_keys = Vec::new();
        for (foreign_table, mut pairs) in grouped.into_values() {
            pairs.sort_by_key(|(seq, _, _)| *seq);
            let columns: Vec<String> = pairs.iter().map(|(_, from, _)| from.clone()).collect();
            let foreign_columns: Vec<String> = pairs
                .iter()
                .map(|(_, _, to)| to.clone())
                .collect::<Option<_>>()
                .unwrap_or_default();

            let declaration = declared.iter().find(|definition| match &definition.kind {
                ConstraintKind::ForeignKey {
                    foreign_table: declared_table,
                    ..
                } => {
                    declared_table.eq_ignore_ascii_case(&foreign_table)
                        && same_columns(&definition.columns, &columns)
                }
                ConstraintKind::Unique => false,
            });
            let name = declaration.and_then(|definition| definition.name.clone());
            let (deferrable, initially_deferred) = declaration
                .map_or((false, false), |d| (d.deferrable, d.initially_deferred));

            match ForeignKeyConstraint::new(name, columns, foreign_table, foreign_columns) {
                Some(foreign_key) => {
                    foreign_keys.push(foreign_key.with_deferral(deferrable, initially_deferred))
                }
                None => tracing::warn!(table, "skipping malformed foreign key"),
            }
        }

        foreign_keys.sort();
        Ok(foreign_keys)
    }
}

impl<E: StatementExecutor> TransactionCoordinator<E> {
    /// Introspector over the coordinated connection, using its capability descriptor
    pub fn introspector(&self) -> ConstraintIntrospector<'_, E> {
        ConstraintIntrospector::new(self.executor()).with_capabilities(self.capabilities())
    }
}

fn position(row: &DatabaseRow, default: i64) -> i64 {
    row.get("position")
        .or_else(|| row.get("seqno"))
        .or_else(|| row.get("seq"))
        .and_then(DatabaseValue::as_long)
        .unwrap_or(default)
}

fn same_columns(left: &[String], right: &[String]) -> bool {
    left.len() == right.len()
        && left
            .iter()
            .zip(right)
            .all(|(l, r)| l.eq_ignore_ascii_case(r))
}

#[derive(Default)]
struct UniqueRows {
    columns: Vec<(i64, String)>,
    deferrable: bool,
    initially_deferred: bool,
}

fn collect_unique_constraints(rows: &[DatabaseRow]) -> Vec<UniqueConstraint> {
    let mut grouped: BTreeMap<String, UniqueRows> = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        let (Some(name), Some(column)) = (row.get_string("constraint_name"), row.get_string("column_name"))
        else {
            continue;
        };
        let entry = grouped.entry(name).or_default();
        entry.columns.push((position(row, index as i64), column));
        entry.deferrable |= row.get_flag("is_deferrable");
        entry.initially_deferred |= row.get_flag("initially_deferred");
    }

    grouped
        .into_iter()
        .filter_map(|(name, mut entry)| {
            entry.columns.sort_by_key(|(position, _)| *position);
            let columns = entry.columns.into_iter().map(|(_, column)| column).collect();
            let constraint = UniqueConstraint::new(name, columns);
            if constraint.is_none() {
                tracing::warn!("skipping unique constraint with duplicate or missing columns");
            }
            constraint.map(|c| c.with_deferral(entry.deferrable, entry.initially_deferred))
        })
        .collect()
}

#[derive(Default)]
struct ForeignKeyRows {
    foreign_table: String,
    columns: Vec<(i64, String, Option<String>)>,
    deferrable: bool,
    initially_deferred: bool,
}

fn collect_foreign_keys(rows: &[DatabaseRow]) -> Vec<ForeignKeyConstraint> {
    let mut grouped: BTreeMap<String, ForeignKeyRows> = BTreeMap::new();
    for (index, row) in rows.iter().enumerate() {
        let (Some(name), Some(column)) = (row.get_string("constraint_name"), row.get_string("column_name"))
        else {
            continue;
        };
        let entry = grouped.entry(name).or_default();
        if let Some(foreign_table) = row.get_string("foreign_table") {
            entry.foreign_table = foreign_table;
        }
        entry.columns.push((
            position(row, index as i64),
            column,
            row.get_string("foreign_column"),
        ));
        entry.deferrable |= row.get_flag("is_deferrable");
        entry.initially_deferred |= row.get_flag("initially_deferred");
    }

    grouped
        .into_iter()
        .filter_map(|(name, mut entry)| {
            entry.columns.sort_by_key(|(position, _, _)| *position);
            let foreign_columns = entry
                .columns
                .iter()
                .map(|(_, _, foreign)| foreign.clone())
                .collect::<Option<Vec<_>>>()
                .unwrap_or_default();
            let columns = entry.columns.into_iter().map(|(_, column, _)| column).collect();
            ForeignKeyConstraint::new(Some(name), columns, entry.foreign_table, foreign_columns)
                .map(|fk| fk.with_deferral(entry.deferrable, entry.initially_deferred))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::{DriverError, DriverResult, ErrorKind};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Answers catalog queries with canned rows and records the SQL it sees
    struct CatalogExecutor {
        database_type: DatabaseType,
        rows: DatabaseResult,
        log: Mutex<Vec<String>>,
    }

    impl CatalogExecutor {
        fn new(database_type: DatabaseType, rows: DatabaseResult) -> Self {
            Self {
                database_type,
                rows,
                log: Mutex::new(Vec::new()),
            }
        }

        fn queries(&self) -> Vec<String> {
            self.log.lock().clone()
        }
    }

    #[async_trait]
    impl StatementExecutor for CatalogExecutor {
        fn database_type(&self) -> DatabaseType {
            self.database_type
        }

        async fn execute(&self, sql: &str) -> DriverResult<u64> {
            self.log.lock().push(sql.to_string());
            Ok(0)
        }

        async fn query(&self, sql: &str) -> DriverResult<DatabaseResult> {
            self.log.lock().push(sql.to_string());
            if sql.contains("missing_relation") {
                return Err(DriverError::new("42P01", "relation \"missing_relation\" does not exist"));
            }
            Ok(self.rows.clone())
        }
    }

    fn row(name: &str, column: &str, position: i64) -> DatabaseRow {
        [
            ("constraint_name", DatabaseValue::from(name)),
            ("column_name", DatabaseValue::from(column)),
            ("position", DatabaseValue::from(position)),
        ]
        .into_iter()
        .collect()
    }

    #[tokio::test]
    async fn test_unique_constraints_grouped_and_sorted() -> Result<()> {
        let rows = vec![
            row("uniq_b", "b", 1),
            row("uniq_a", "y", 2),
            row("uniq_a", "x", 1),
        ];
        let executor = CatalogExecutor::new(DatabaseType::Postgres, rows);
        let introspector = ConstraintIntrospector::new(&executor);

        let constraints = introspector.list_unique_constraints("users", None).await?;
        assert_eq!(constraints.len(), 2);
        assert_eq!(constraints[0].name(), "uniq_a");
        assert_eq!(constraints[0].columns(), ["x".to_string(), "y".to_string()]);
        assert_eq!(constraints[1].name(), "uniq_b");
        Ok(())
    }

    #[tokio::test]
    async fn test_default_schema_per_backend() -> Result<()> {
        let expected = [
            (DatabaseType::Postgres, "current_schema()"),
            (DatabaseType::Mysql, "DATABASE()"),
            (DatabaseType::Oracle, "SYS_CONTEXT('USERENV', 'CURRENT_SCHEMA')"),
            (DatabaseType::SqlServer, "SCHEMA_NAME()"),
        ];
        for (db_type, default_schema) in expected {
            let executor = CatalogExecutor::new(db_type, Vec::new());
            let introspector = ConstraintIntrospector::new(&executor);
            introspector.list_unique_constraints("users", None).await?;
            introspector.list_foreign_keys("users", None).await?;
            for sql in executor.queries() {
                assert!(sql.contains(default_schema), "{}: {}", db_type, sql);
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_database_reaches_every_query() -> Result<()> {
        for db_type in [
            DatabaseType::Postgres,
            DatabaseType::Mysql,
            DatabaseType::Oracle,
            DatabaseType::SqlServer,
        ] {
            let executor = CatalogExecutor::new(db_type, Vec::new());
            let introspector = ConstraintIntrospector::new(&executor);
            introspector
                .list_unique_constraints("users", Some("reporting"))
                .await?;
            introspector.list_foreign_keys("users", Some("reporting")).await?;

            let queries = executor.queries();
            assert_eq!(queries.len(), 2);
            for sql in queries {
                assert!(sql.contains("'reporting'"), "{}: {}", db_type, sql);
                assert!(!sql.contains("current_schema()"), "{}: {}", db_type, sql);
                assert!(!sql.contains("DATABASE()"), "{}: {}", db_type, sql);
            }
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_folds_unquoted_table_names() -> Result<()> {
        let executor = CatalogExecutor::new(DatabaseType::Oracle, Vec::new());
        let introspector = ConstraintIntrospector::new(&executor);
        introspector.list_unique_constraints("users", None).await?;
        introspector.list_unique_constraints("\"MixedCase\"", None).await?;

        let queries = executor.queries();
        assert!(queries[0].contains("c.table_name = 'USERS'"));
        assert!(queries[1].contains("c.table_name = 'MixedCase'"));
        Ok(())
    }

    #[tokio::test]
    async fn test_oracle_deferral_flags() -> Result<()> {
        let mut deferred = row("UNIQ_EMAIL", "EMAIL", 1);
        deferred.insert("IS_DEFERRABLE", "DEFERRABLE");
        deferred.insert("INITIALLY_DEFERRED", "DEFERRED");
        let executor = CatalogExecutor::new(DatabaseType::Oracle, vec![deferred]);
        let introspector = ConstraintIntrospector::new(&executor);

        let constraints = introspector.list_unique_constraints("users", None).await?;
        assert!(constraints[0].is_deferrable());
        assert!(constraints[0].is_initially_deferred());
        assert!(constraints[0].name_matches("uniq_email", introspector.name_casing()));
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_keys_pair_columns() -> Result<()> {
        let mut first = row("fk_order_customer", "customer_id", 1);
        first.insert("foreign_table", "customers");
        first.insert("foreign_column", "id");
        let mut second = row("fk_order_customer", "customer_region", 2);
        second.insert("foreign_table", "customers");
        second.insert("foreign_column", "region");
        let executor = CatalogExecutor::new(DatabaseType::Mysql, vec![second, first]);
        let introspector = ConstraintIntrospector::new(&executor);

        let foreign_keys = introspector.list_foreign_keys("orders", Some("shop")).await?;
        assert_eq!(foreign_keys.len(), 1);
        assert_eq!(foreign_keys[0].name(), Some("fk_order_customer"));
        assert_eq!(foreign_keys[0].foreign_table(), "customers");
        assert_eq!(foreign_keys[0].columns(), ["customer_id".to_string(), "customer_region".to_string()]);
        assert_eq!(foreign_keys[0].foreign_columns(), ["id".to_string(), "region".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_catalog_failure_is_classified() {
        let executor = CatalogExecutor::new(DatabaseType::Postgres, Vec::new());
        let introspector = ConstraintIntrospector::new(&executor);
        let err = introspector
            .list_unique_constraints("missing_relation", None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownDriverError);
        assert_eq!(err.classified().map(|c| c.raw_code()), Some("42P01"));
    }

    #[tokio::test]
    async fn test_table_ddl_unavailable_on_postgres() {
        let executor = CatalogExecutor::new(DatabaseType::Postgres, Vec::new());
        let introspector = ConstraintIntrospector::new(&executor);
        assert_eq!(
            introspector.table_ddl("users", None).await.map_err(|e| e.kind()),
            Err(ErrorKind::Capability)
        );
        assert!(executor.queries().is_empty());
    }

    #[tokio::test]
    async fn test_mysql_column_metadata_from_show_create() -> Result<()> {
        let ddl = "CREATE TABLE `users` (\n  `email` varchar(255) COLLATE utf8mb4_bin NOT NULL\n)";
        let create: DatabaseRow = [("Table", "users"), ("Create Table", ddl)].into_iter().collect();
        let executor = CatalogExecutor::new(DatabaseType::Mysql, vec![create]);
        let introspector = ConstraintIntrospector::new(&executor);

        let metadata = introspector
            .column_metadata("users", "email", Some("shop"))
            .await?
            .expect("column exists");
        assert_eq!(metadata.collation.as_deref(), Some("utf8mb4_bin"));
        assert_eq!(executor.queries(), vec!["SHOW CREATE TABLE `shop`.`users`"]);
        Ok(())
    }
}
