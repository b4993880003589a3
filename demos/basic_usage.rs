//! Basic usage example
//!
//! This example demonstrates the typed statement flow:
//! - Declaring a table with typed columns
//! - Inserting and upserting rows
//! - Querying with the typed WHERE builder
//! - Deleting rows
//!
//! Run with: cargo run --example basic_usage

use rust_typed_sql::prelude::*;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    println!("=== Rust Typed SQL - Basic Usage Example ===\n");

    let registry = Arc::new(TypeRegistry::with_builtins());
    let db = SqliteDatabase::new();

    println!("1. Connecting to database...");
    db.connect(":memory:").await?;
    println!("   ✓ Connected\n");

    println!("2. Creating table...");
    let users = Table::new("users")
        .column(Column::new("id", Arc::new(BigInt::new(20))).primary_key())?
        .column(Column::new("username", Arc::new(Char::new(32))).not_null().unique())?
        .column(Column::new("email", Arc::new(Text::new(255))).not_null())?
        .column(Column::new("age", Arc::new(SmallInt::new(6))))?
        .column(Column::new("balance", Arc::new(Double::new())).default_value(0.0))?
        .column(Column::new("is_active", Arc::new(Boolean::new())).default_value(true))?;
    let ddl = users.create_sql()?;
    println!("   {}", ddl);
    db.execute(&ddl).await?;
    println!("   ✓ Table created\n");

    println!("3. Inserting data...");
    let rows: [(i64, &str, &str, i16, f64); 4] = [
        (1, "alice", "alice@example.com", 30, 1500.50),
        (2, "bob", "bob@example.com", 25, 2300.75),
        (3, "charlie", "charlie@example.com", 35, 980.25),
        (4, "diana", "diana@example.com", 28, 3200.00),
    ];
    for (id, username, email, age, balance) in rows {
        let affected = InsertBuilder::for_table(&users, Arc::clone(&registry))
            .add("id", id)?
            .add("username", username)?
            .add("email", email)?
            .add("age", age)?
            .add("balance", balance)?
            .send(&db)
            .await?;
        println!("   ✓ Inserted {} row(s)", affected);
    }
    println!();

    println!("4. Querying users aged 26 to 40...");
    let select = SelectBuilder::for_table(&users)
        .columns(&["id", "username", "age"])
        .filter(
            Where::with_dialect(Arc::clone(&registry), DatabaseType::Sqlite)
                .key("age")
                .between(26i16, 40i16)?
                .and("is_active")
                .is_true()
                .order_by("age", OrderDirection::Asc),
        );
    println!("   SQL: {}", select.build_as_raw().sql);
    for row in select.send(&db).await? {
        let username = row
            .get("username")
            .ok_or_else(|| DatabaseError::ColumnNotFound("username".to_string()))?
            .as_string();
        let age = users
            .column_type("age")
            .ok_or_else(|| DatabaseError::ColumnNotFound("age".to_string()))?
            .decode(&row, "age")?;
        println!("   - {} (age {:?})", username, age.and_then(|v| v.as_long()));
    }
    println!();

    println!("5. Upserting bob's balance...");
    let upsert = UpsertBuilder::for_table(&users, Arc::clone(&registry))
        .add("id", 2i64)?
        .add("username", "bob")?
        .add("email", "bob@example.org")?
        .add("balance", 2500.0)?;
    println!("   SQL: {}", upsert.build_as_raw(DatabaseType::Sqlite)?.sql);
    upsert.send(&db).await?;
    println!("   ✓ Upserted\n");

    println!("6. Deleting users named like 'c%'...");
    let deleted = DeleteBuilder::new(users.name())
        .filter(
            Where::with_dialect(Arc::clone(&registry), DatabaseType::Sqlite)
                .key("username")
                .like("c%")?,
        )
        .send(&db)
        .await?;
    println!("   ✓ Deleted {} row(s)\n", deleted);

    let remaining = SelectBuilder::for_table(&users).send(&db).await?;
    println!("7. {} users remain", remaining.len());

    db.disconnect().await?;
    println!("\n=== Example completed successfully ===");
    Ok(())
}
