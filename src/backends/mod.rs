//! Database backend implementations
//!
//! This module contains concrete implementations of the Database trait
//! for various database systems.

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "mysql")]
pub mod mysql;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;

#[cfg(feature = "postgres")]
pub use postgres::PostgresDatabase;

#[cfg(feature = "mysql")]
pub use mysql::MysqlDatabase;

use crate::core::database::{ConnectionBuilder, Database};
use crate::core::database_types::DatabaseType;
use crate::core::error::{DatabaseError, Result};

/// Open a connection described by `builder` using the matching backend
///
/// # Errors
///
/// Returns `UnsupportedOperation` when the backend's feature is not enabled
pub async fn connect(builder: &ConnectionBuilder) -> Result<Box<dyn Database>> {
    let connection_string = builder.build_connection_string();
    let db: Box<dyn Database> = match builder.database_type() {
        #[cfg(feature = "sqlite")]
        DatabaseType::Sqlite => {
            Box::new(SqliteDatabase::new().with_operation_timeout(builder.timeout()))
        }
        #[cfg(feature = "postgres")]
        DatabaseType::Postgres => {
            Box::new(PostgresDatabase::new().with_operation_timeout(builder.timeout()))
        }
        #[cfg(feature = "mysql")]
        DatabaseType::Mysql => {
            Box::new(MysqlDatabase::new().with_operation_timeout(builder.timeout()))
        }
        other => {
            return Err(DatabaseError::unsupported(format!(
                "no backend compiled in for {}",
                other
            )))
        }
    };
    db.connect(&connection_string).await?;
    Ok(db)
}
