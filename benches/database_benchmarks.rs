//! Criterion benchmarks for rust_typed_sql

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rust_typed_sql::core::column_type::builtins;
use rust_typed_sql::prelude::*;
use std::sync::Arc;

// ============================================================================
// WHERE Builder Benchmarks
// ============================================================================

fn bench_where_builder(c: &mut Criterion) {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut group = c.benchmark_group("where_builder");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_equal", |b| {
        b.iter(|| {
            let raw = Where::new(Arc::clone(&registry))
                .key("id")
                .equal(black_box(42i64))
                .map(|w| w.build_as_raw());
            black_box(raw)
        });
    });

    group.bench_function("mixed_chain", |b| {
        b.iter(|| {
            let raw = Where::new(Arc::clone(&registry))
                .key("age")
                .between(black_box(18i16), black_box(65i16))
                .and_then(|w| w.and("name").like("A%"))
                .map(|w| w.or("deleted").is_null())
                .map(|w| w.order_by("age", OrderDirection::Desc).limit(50).build_as_raw());
            black_box(raw)
        });
    });

    for size in [1usize, 10, 100, 1000] {
        let ids: Vec<i64> = (0..size as i64).collect();
        group.bench_with_input(BenchmarkId::new("in_list", size), &ids, |b, ids| {
            b.iter(|| {
                let raw = Where::new(Arc::clone(&registry))
                    .key("id")
                    .is_in(ids.iter().copied())
                    .map(|w| w.build_as_raw());
                black_box(raw)
            });
        });
    }

    group.finish();
}

// ============================================================================
// Type Registry Benchmarks
// ============================================================================

fn bench_registry(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));

    let registry = TypeRegistry::with_builtins();
    black_box(registry.lookup(ValueKind::Long));

    group.bench_function("cached_lookup", |b| {
        b.iter(|| black_box(registry.lookup(black_box(ValueKind::Long))));
    });

    group.bench_function("first_for_value", |b| {
        let value = DatabaseValue::from("hello");
        b.iter(|| black_box(registry.first(black_box(&value))));
    });

    group.bench_function("cold_lookup", |b| {
        b.iter(|| {
            let fresh = TypeRegistry::with_builtins();
            black_box(fresh.lookup(black_box(ValueKind::Int)))
        });
    });

    group.finish();
}

// ============================================================================
// Column Type Encoding Benchmarks
// ============================================================================

fn sample_value(column_type: &dyn ColumnType) -> DatabaseValue {
    match column_type.native_kind() {
        ValueKind::Bool => DatabaseValue::Bool(true),
        ValueKind::Short => DatabaseValue::Short(-1234),
        ValueKind::Int => DatabaseValue::Int(4321),
        ValueKind::Long => DatabaseValue::Long(123_456_789),
        ValueKind::Double => DatabaseValue::Double(std::f64::consts::PI),
        ValueKind::Decimal => DatabaseValue::Decimal(UBigInt::max_value()),
        ValueKind::String => DatabaseValue::String("Hello, World!".to_string()),
        ValueKind::Bytes => DatabaseValue::Bytes(vec![1u8, 2, 3, 4, 5]),
        ValueKind::DateTime => chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(12, 30, 0))
            .map_or(DatabaseValue::Null, DatabaseValue::DateTime),
        _ => DatabaseValue::Null,
    }
}

fn bench_codec_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_encode");
    group.throughput(Throughput::Elements(1));

    for column_type in builtins() {
        let value = sample_value(column_type.as_ref());
        let id = format!("{}_{}", column_type.name(), column_type.native_kind());
        group.bench_with_input(BenchmarkId::from_parameter(id), &value, |b, value| {
            let mut statement = PreparedStatement::new("SELECT ?");
            b.iter(|| {
                let result = column_type.encode(&mut statement, 1, black_box(value));
                black_box(result)
            });
        });
    }

    group.bench_function("text_stringify_long", |b| {
        let codec = Text::new(255);
        let value = DatabaseValue::Long(987_654_321);
        let mut statement = PreparedStatement::new("SELECT ?");
        b.iter(|| black_box(codec.encode(&mut statement, 1, black_box(&value))));
    });

    group.finish();
}

// ============================================================================
// Statement Assembly Benchmarks
// ============================================================================

fn bench_statement_assembly(c: &mut Criterion) {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let mut group = c.benchmark_group("statement_assembly");

    let table = Table::new("users")
        .column(Column::new("id", Arc::new(BigInt::new(20))).primary_key())
        .and_then(|t| t.column(Column::new("name", Arc::new(Char::new(64)))))
        .and_then(|t| t.column(Column::new("age", Arc::new(SmallInt::new(6)))));
    let Ok(table) = table else {
        return;
    };

    group.bench_function("select_raw", |b| {
        b.iter(|| {
            let raw = Where::new(Arc::clone(&registry))
                .key("age")
                .greater(black_box(21i16))
                .map(|w| SelectBuilder::for_table(&table).filter(w).build_as_raw());
            black_box(raw)
        });
    });

    group.bench_function("insert_raw", |b| {
        b.iter(|| {
            let raw = InsertBuilder::for_table(&table, Arc::clone(&registry))
                .add("id", black_box(1i64))
                .and_then(|i| i.add("name", "Alice"))
                .and_then(|i| i.add("age", 30i16))
                .and_then(|i| i.build_as_raw());
            black_box(raw)
        });
    });

    for dialect in [DatabaseType::Mysql, DatabaseType::Postgres] {
        group.bench_with_input(
            BenchmarkId::new("upsert_raw", dialect),
            &dialect,
            |b, dialect| {
                b.iter(|| {
                    let raw = UpsertBuilder::for_table(&table, Arc::clone(&registry))
                        .add("id", black_box(1i64))
                        .and_then(|u| u.add("name", "Alice"))
                        .and_then(|u| u.build_as_raw(*dialect));
                    black_box(raw)
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// JSON Serialization Benchmarks
// ============================================================================

fn bench_json_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("json_serialization");

    let mut row = DatabaseRow::new();
    row.insert("id".to_string(), DatabaseValue::Long(1));
    row.insert("name".to_string(), DatabaseValue::from("Alice"));
    row.insert("total".to_string(), DatabaseValue::Decimal(UBigInt::max_value()));
    row.insert("active".to_string(), DatabaseValue::Bool(true));

    group.bench_function("serialize_row", |b| {
        b.iter(|| black_box(serde_json::to_string(black_box(&row))));
    });

    if let Ok(json) = serde_json::to_string(&row) {
        group.bench_function("deserialize_row", |b| {
            b.iter(|| black_box(serde_json::from_str::<DatabaseRow>(black_box(&json))));
        });
    }

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_where_builder,
    bench_registry,
    bench_codec_encode,
    bench_statement_assembly,
    bench_json_serialization
);

criterion_main!(benches);
