//! Column types example
//!
//! This example demonstrates how column types bind and read values:
//! - Registry lookup by value kind
//! - Wrapping and range-checked integers
//! - Text conversion
//! - Null handling
//!
//! Run with: cargo run --example value_types

use rust_typed_sql::prelude::*;
use std::sync::Arc;

async fn round_trip(
    db: &SqliteDatabase,
    column_type: &dyn ColumnType,
    value: DatabaseValue,
) -> Result<Option<DatabaseValue>> {
    let mut statement = db.prepare_statement("SELECT ? AS v")?;
    column_type.encode(&mut statement, 1, &value)?;
    let rows = db.execute_query(&statement).await?;
    let row = rows
        .first()
        .ok_or_else(|| DatabaseError::query("empty result"))?;
    column_type.decode(row, "v")
}

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Typed SQL - Column Types Example ===\n");

    let db = SqliteDatabase::new();
    db.connect(":memory:").await?;

    println!("1. Registry lookup by value kind...");
    let registry = TypeRegistry::with_builtins();
    let samples: Vec<DatabaseValue> = vec![
        true.into(),
        7i16.into(),
        7i32.into(),
        7i64.into(),
        u64::MAX.into(),
        2.5f64.into(),
        "text".into(),
        vec![0xCAu8, 0xFE].into(),
    ];
    for value in &samples {
        let types = registry.lookup(value.kind());
        let names: Vec<String> = types.iter().map(|t| t.declaration()).collect();
        println!("   {:<8} -> {}", value.kind(), names.join(", "));
    }
    match registry.first(&DatabaseValue::Null) {
        Ok(t) => println!("   null     -> {}", t.name()),
        Err(e) => println!("   null     -> {}", e),
    }
    println!();

    println!("2. SMALLINT wraps out of range values...");
    for n in [32767i32, 32768, -32769] {
        let decoded = round_trip(&db, &SmallInt::new(6), n.into()).await?;
        println!("   {:>6} -> {:?}", n, decoded);
    }
    println!();

    println!("3. Unsigned BIGINT checks its range...");
    let ubigint = UBigInt::new(20);
    println!(
        "   max   -> {:?}",
        round_trip(&db, &ubigint, UBigInt::max_value().into()).await?
    );
    match round_trip(&db, &ubigint, (-1i64).into()).await {
        Ok(v) => println!("   -1    -> {:?}", v),
        Err(e) => println!("   -1    -> {}", e),
    }
    println!();

    println!("4. TEXT binds the string form of any value...");
    let text = Text::new(255);
    for value in [DatabaseValue::Long(42), DatabaseValue::Bool(false), 1.25f64.into()] {
        println!("   {:?} -> {:?}", value, round_trip(&db, &text, value.clone()).await?);
    }
    println!();

    println!("5. Null handling...");
    let datetime: Arc<dyn ColumnType> = Arc::new(DateTime::new(Some(DateDefault::CurrentTimestamp)));
    println!(
        "   {} -> {:?}",
        datetime.declaration(),
        round_trip(&db, datetime.as_ref(), DatabaseValue::Null).await?
    );
    println!(
        "   {} default -> {:?}",
        datetime.name(),
        datetime.default_literal()
    );

    db.disconnect().await?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
