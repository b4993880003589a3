//! Core query system types and traits
//!
//! This module provides the building blocks of the system: values and their
//! column type codecs, the type registry, the typed WHERE builder, statement
//! builders and the database connection trait.

pub mod column_type;
pub mod database;
pub mod database_types;
pub mod error;
pub mod query_builder;
pub mod registry;
pub mod schema;
pub mod statement;
pub mod value;
pub mod where_builder;

// Re-export commonly used types
pub use column_type::{ColumnFlags, ColumnType, SqlCode};
pub use database::{ConnectionBuilder, Database};
pub use database_types::DatabaseType;
pub use error::{DatabaseError, Result};
pub use query_builder::{DeleteBuilder, InsertBuilder, RawStatement, SelectBuilder, UpsertBuilder};
pub use registry::TypeRegistry;
pub use schema::{Column, Table};
pub use statement::{Binding, PreparedStatement, StatementAssembler};
pub use value::{DatabaseResult, DatabaseRow, DatabaseValue, ValueKind};
pub use where_builder::{FilteredWhere, KeyedWhere, OrderDirection, RawWhere, Where, WhereClause};
