//! Criterion benchmarks for rust_database_core

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_database_core::core::{classify, DatabaseType};
use rust_database_core::schema::{parse_column_metadata, parse_table_constraints};

// ============================================================================
// Error Classification Benchmarks
// ============================================================================

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    group.throughput(Throughput::Elements(1));

    let cases = [
        (
            "postgres_unique",
            DatabaseType::Postgres,
            "23505",
            "duplicate key value violates unique constraint \"users_email_key\"",
        ),
        (
            "mysql_deadlock",
            DatabaseType::Mysql,
            "1213",
            "Deadlock found when trying to get lock; try restarting transaction",
        ),
        (
            "sqlite_message_only",
            DatabaseType::Sqlite,
            "",
            "UNIQUE constraint failed: users.email",
        ),
        (
            "oracle_embedded_code",
            DatabaseType::Oracle,
            "",
            "ORA-00001: unique constraint (APP.UNIQ_EMAIL) violated",
        ),
        (
            "sqlserver_unknown",
            DatabaseType::SqlServer,
            "50000",
            "custom error raised by trigger",
        ),
    ];

    for (name, db_type, code, message) in cases {
        group.bench_function(name, |b| {
            b.iter(|| {
                let classified = classify(black_box(code), black_box(message), db_type);
                black_box(classified)
            });
        });
    }

    group.finish();
}

// ============================================================================
// DDL Parsing Benchmarks
// ============================================================================

fn create_table(columns: usize) -> String {
    let mut ddl = String::from("CREATE TABLE \"wide\" (\n  \"id\" INTEGER PRIMARY KEY,\n");
    for i in 0..columns {
        ddl.push_str(&format!(
            "  \"col_{}\" TEXT COLLATE \"C\" NOT NULL DEFAULT 'a,b', -- (DC2Type:json)\n",
            i
        ));
    }
    ddl.push_str("  CONSTRAINT \"uniq_first\" UNIQUE (\"col_0\", \"col_1\") DEFERRABLE\n)");
    ddl
}

fn bench_ddl_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("ddl_parsing");

    for columns in [10, 100, 500] {
        let ddl = create_table(columns);
        let last = format!("col_{}", columns - 1);
        group.throughput(Throughput::Bytes(ddl.len() as u64));

        group.bench_with_input(
            BenchmarkId::new("column_metadata", columns),
            &ddl,
            |b, ddl| {
                b.iter(|| {
                    let metadata = parse_column_metadata(black_box(&last), black_box(ddl));
                    black_box(metadata)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("table_constraints", columns),
            &ddl,
            |b, ddl| {
                b.iter(|| {
                    let constraints = parse_table_constraints(black_box(ddl));
                    black_box(constraints)
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_classify, bench_ddl_parsing);

criterion_main!(benches);
