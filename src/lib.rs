//! # Rust Typed SQL
//!
//! Typed statement construction over relational databases. Tables declare columns
//! with SQL column types, predicates are built by a small state machine, and every
//! value reaches the driver as a bound parameter encoded by its column type.
//!
//! ## Features
//!
//! - **Typed predicates**: `Where` → `KeyedWhere` → `FilteredWhere`; invalid call
//!   sequences do not compile
//! - **Column type codecs**: BIT, SMALLINT, unsigned SMALLINT, INT, BIGINT,
//!   unsigned BIGINT, DOUBLE, CHAR, TEXT, DATETIME and BLOB, each with its own
//!   encode/decode rules and constraint flags
//! - **Type registry**: values without an explicit column type get the
//!   highest-priority registered type for their kind
//! - **Async Support**: Async/await support with Tokio
//! - **Multiple Backends**: SQLite, PostgreSQL and MySQL behind one object-safe trait
//!
//! ## Supported Databases
//!
//! | Database | Feature | Equality operator |
//! |----------|---------|-------------------|
//! | SQLite | `sqlite` (default) | `IS` |
//! | PostgreSQL | `postgres` | `IS NOT DISTINCT FROM` |
//! | MySQL | `mysql` | `<=>` |
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rust_typed_sql::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let registry = Arc::new(TypeRegistry::with_builtins());
//!     let db = SqliteDatabase::new();
//!     db.connect(":memory:").await?;
//!
//!     let users = Table::new("users")
//!         .column(Column::new("id", Arc::new(BigInt::new(20))).primary_key())?
//!         .column(Column::new("name", Arc::new(Char::new(64))).not_null())?;
//!     db.execute(&users.create_sql()?).await?;
//!
//!     InsertBuilder::for_table(&users, Arc::clone(&registry))
//!         .add("id", 1i64)?
//!         .add("name", "Alice")?
//!         .send(&db)
//!         .await?;
//!
//!     let rows = SelectBuilder::for_table(&users)
//!         .filter(
//!             Where::with_dialect(registry, DatabaseType::Sqlite)
//!                 .key("name")
//!                 .like("A%")?,
//!         )
//!         .send(&db)
//!         .await?;
//!
//!     for row in rows {
//!         if let Some(name) = row.get("name") {
//!             println!("User: {}", name.as_string());
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Project Structure
//!
//! ```text
//! rust_typed_sql/
//! ├── src/
//! │   ├── core/
//! │   │   ├── column_type/     # Column type codecs
//! │   │   ├── database.rs      # Database trait, ConnectionBuilder
//! │   │   ├── error.rs         # Error types
//! │   │   ├── query_builder.rs # SELECT/INSERT/UPSERT/DELETE
//! │   │   ├── registry.rs      # TypeRegistry
//! │   │   ├── schema.rs        # Table and Column
//! │   │   ├── statement.rs     # PreparedStatement, StatementAssembler
//! │   │   ├── value.rs         # DatabaseValue, ValueKind
//! │   │   └── where_builder.rs # Typed WHERE builder
//! │   ├── backends/            # SQLite, PostgreSQL, MySQL
//! │   └── lib.rs
//! ├── demos/
//! ├── tests/
//! └── benches/
//! ```

/// Core query system types and traits
pub mod core;

/// Database backend implementations
pub mod backends;

/// Prelude for convenient imports
///
/// ```rust
/// use rust_typed_sql::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> Result<()> {
///     let db = SqliteDatabase::new();
///     db.connect(":memory:").await?;
///     Ok(())
/// }
/// ```
pub mod prelude {
    pub use crate::core::column_type::{
        BigInt, Blob, Boolean, Char, DateDefault, DateTime, Double, Integer, SmallInt, Text,
        UBigInt, USmallInt,
    };
    pub use crate::core::{
        Binding, Column, ColumnType, ConnectionBuilder, Database, DatabaseError, DatabaseResult,
        DatabaseRow, DatabaseType, DatabaseValue, DeleteBuilder, InsertBuilder, OrderDirection,
        PreparedStatement, Result, SelectBuilder, StatementAssembler, Table, TypeRegistry,
        UpsertBuilder, ValueKind, Where, WhereClause,
    };

    #[cfg(feature = "sqlite")]
    pub use crate::backends::SqliteDatabase;

    #[cfg(feature = "postgres")]
    pub use crate::backends::PostgresDatabase;

    #[cfg(feature = "mysql")]
    pub use crate::backends::MysqlDatabase;
}

// Re-export at root level for convenience
pub use core::{
    ConnectionBuilder, Database, DatabaseError, DatabaseResult, DatabaseRow, DatabaseType,
    DatabaseValue, Result, TypeRegistry, Where,
};

#[cfg(feature = "sqlite")]
pub use backends::SqliteDatabase;
