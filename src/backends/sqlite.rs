//! SQLite database backend implementation
//!
//! This module provides a SQLite implementation of the Database trait. rusqlite is
//! synchronous, so every call runs on the blocking thread pool under the
//! configured operation timeout.

use crate::core::{
    database::{Database, DEFAULT_OPERATION_TIMEOUT},
    database_types::DatabaseType,
    error::{DatabaseError, Result},
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use rusqlite::{params_from_iter, Connection, Row};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Text layout used to store datetimes; SQLite has no native datetime type
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// SQLite database implementation
pub struct SqliteDatabase {
    connection: Arc<Mutex<Option<Connection>>>,
    connected: Arc<AtomicBool>,
    connection_string: SyncMutex<Option<String>>,
    operation_timeout: Duration,
}

impl SqliteDatabase {
    /// Create a new SQLite database instance
    pub fn new() -> Self {
        Self {
            connection: Arc::new(Mutex::new(None)),
            connected: Arc::new(AtomicBool::new(false)),
            connection_string: SyncMutex::new(None),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Replace the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Convert a rusqlite Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> rusqlite::Result<DatabaseRow> {
        let mut db_row = DatabaseRow::new();
        let column_count = row.as_ref().column_count();

        for i in 0..column_count {
            let column_name = row.as_ref().column_name(i)?.to_string();
            let value = match row.get_ref(i)? {
                rusqlite::types::ValueRef::Null => DatabaseValue::Null,
                rusqlite::types::ValueRef::Integer(v) => DatabaseValue::Long(v),
                rusqlite::types::ValueRef::Real(v) => DatabaseValue::Double(v),
                rusqlite::types::ValueRef::Text(v) => {
                    DatabaseValue::String(String::from_utf8_lossy(v).to_string())
                }
                rusqlite::types::ValueRef::Blob(v) => DatabaseValue::Bytes(v.to_vec()),
            };
            db_row.insert(column_name, value);
        }

        Ok(db_row)
    }

    /// Convert DatabaseValue to rusqlite parameter
    fn value_to_param(value: &DatabaseValue) -> Box<dyn rusqlite::ToSql> {
        match value {
            DatabaseValue::Null => Box::new(None::<i64>),
            DatabaseValue::Bool(v) => Box::new(*v),
            DatabaseValue::Short(v) => Box::new(*v),
            DatabaseValue::Int(v) => Box::new(*v),
            DatabaseValue::Long(v) => Box::new(*v),
            DatabaseValue::Float(v) => Box::new(*v),
            DatabaseValue::Double(v) => Box::new(*v),
            // Kept as text; 64-bit unsigned values overflow INTEGER
            DatabaseValue::Decimal(v) => Box::new(v.to_string()),
            DatabaseValue::String(v) => Box::new(v.clone()),
            DatabaseValue::Bytes(v) => Box::new(v.clone()),
            DatabaseValue::DateTime(v) => Box::new(v.format(DATETIME_FORMAT).to_string()),
        }
    }

    /// Run `f` against the open connection on the blocking pool
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let connection_arc = Arc::clone(&self.connection);

        let mut task = tokio::task::spawn_blocking(move || -> Result<T> {
            let connection = connection_arc.blocking_lock();
            let conn = connection
                .as_ref()
                .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;
            f(conn)
        });

        // Use select! to abort task on timeout, preventing resource leaks
        tokio::select! {
            result = &mut task => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))?
            }
            _ = tokio::time::sleep(self.operation_timeout) => {
                task.abort();
                Err(DatabaseError::query_timeout(self.operation_timeout.as_millis() as u64))
            }
        }
    }
}

impl Default for SqliteDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Sqlite
    }

    async fn connect(&self, connection_string: &str) -> Result<()> {
        // Clean up any existing connection first
        self.disconnect().await?;
        *self.connection_string.lock() = Some(connection_string.to_string());

        let path = connection_string.to_string();
        let connection_arc = Arc::clone(&self.connection);
        let connected = Arc::clone(&self.connected);

        let mut task = tokio::task::spawn_blocking(move || -> Result<()> {
            let conn = Connection::open(&path)?;

            // Enable foreign keys
            conn.execute("PRAGMA foreign_keys = ON", [])?;

            let mut connection = connection_arc.blocking_lock();
            *connection = Some(conn);
            connected.store(true, Ordering::SeqCst);

            Ok(())
        });

        tokio::select! {
            result = &mut task => {
                result.map_err(|e| DatabaseError::other(format!("Task join error: {}", e)))??
            }
            _ = tokio::time::sleep(self.operation_timeout) => {
                task.abort();
                return Err(DatabaseError::connection_timeout(self.operation_timeout.as_millis() as u64));
            }
        }

        info!(path = connection_string, "connected to SQLite");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut connection = self.connection.lock().await;
        if connection.take().is_some() {
            debug!("closed SQLite connection");
        }
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn reconnect(&self, force: bool) -> Result<()> {
        if self.is_connected() && !force {
            return Ok(());
        }
        let connection_string = self
            .connection_string
            .lock()
            .clone()
            .ok_or_else(|| DatabaseError::connection("No previous connection to re-open"))?;
        self.connect(&connection_string).await
    }

    async fn execute(&self, query: &str) -> Result<u64> {
        let query = query.to_string();
        self.with_connection(move |conn| {
            let affected = conn.execute(&query, [])?;
            Ok(affected as u64)
        })
        .await
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        self.query_with_params(query, &[]).await
    }

    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        let query = query.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let rusqlite_params: Vec<Box<dyn rusqlite::ToSql>> =
                params.iter().map(Self::value_to_param).collect();

            let mut stmt = conn.prepare(&query)?;
            let rows = stmt.query_map(
                params_from_iter(rusqlite_params.iter()),
                Self::row_to_database_row,
            )?;

            let mut results = Vec::new();
            for row_result in rows {
                results.push(row_result?);
            }

            Ok(results)
        })
        .await
    }

    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        let query = query.to_string();
        let params = params.to_vec();
        self.with_connection(move |conn| {
            let rusqlite_params: Vec<Box<dyn rusqlite::ToSql>> =
                params.iter().map(Self::value_to_param).collect();

            let mut stmt = conn.prepare(&query)?;
            let affected = stmt.execute(params_from_iter(rusqlite_params.iter()))?;

            Ok(affected as u64)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_connect() {
        let db = SqliteDatabase::new();
        assert!(db.connect(":memory:").await.is_ok());
        assert!(db.is_connected());
        assert!(db.disconnect().await.is_ok());
        assert!(!db.is_connected());
    }

    #[tokio::test]
    async fn test_sqlite_execute() -> Result<()> {
        let db = SqliteDatabase::new();
        db.connect(":memory:").await?;

        let result = db
            .execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await;
        assert!(result.is_ok());

        let affected = db
            .execute("INSERT INTO test (name) VALUES ('Alice')")
            .await?;
        assert_eq!(affected, 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_query() -> Result<()> {
        let db = SqliteDatabase::new();
        db.connect(":memory:").await?;

        db.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await?;
        db.execute_with_params(
            "INSERT INTO test (name) VALUES (?)",
            &[DatabaseValue::from("Alice")],
        )
        .await?;
        db.execute("INSERT INTO test (name) VALUES ('Bob')").await?;

        let results = db.query("SELECT * FROM test ORDER BY id").await?;
        assert_eq!(results.len(), 2);

        let name1 = results[0]
            .get("name")
            .ok_or_else(|| DatabaseError::ColumnNotFound("name".to_string()))?
            .as_string();
        assert_eq!(name1, "Alice");

        let name2 = results[1]
            .get("name")
            .ok_or_else(|| DatabaseError::ColumnNotFound("name".to_string()))?
            .as_string();
        assert_eq!(name2, "Bob");

        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_parameter_encoding() -> Result<()> {
        let db = SqliteDatabase::new();
        db.connect(":memory:").await?;

        let at = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .ok_or_else(|| DatabaseError::other("bad date"))?;
        let rows = db
            .query_with_params(
                "SELECT ? AS s, ? AS d, ? AS t",
                &[
                    DatabaseValue::Short(-7),
                    DatabaseValue::from(u64::MAX),
                    DatabaseValue::DateTime(at),
                ],
            )
            .await?;

        assert_eq!(rows[0].get("s"), Some(&DatabaseValue::Long(-7)));
        assert_eq!(
            rows[0].get("d"),
            Some(&DatabaseValue::from("18446744073709551615"))
        );
        assert_eq!(
            rows[0].get("t"),
            Some(&DatabaseValue::from("2024-01-02 03:04:05"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_reconnect() -> Result<()> {
        let db = SqliteDatabase::new();
        assert!(matches!(
            db.reconnect(false).await,
            Err(DatabaseError::ConnectionError(_))
        ));

        db.connect(":memory:").await?;
        db.execute("CREATE TABLE test (id INTEGER)").await?;

        // Not forced: the open connection and its in-memory table survive
        db.reconnect(false).await?;
        assert!(db.query("SELECT * FROM test").await.is_ok());

        // Forced: a fresh in-memory database
        db.reconnect(true).await?;
        assert!(db.is_connected());
        assert!(db.query("SELECT * FROM test").await.is_err());

        db.disconnect().await?;
        db.reconnect(false).await?;
        assert!(db.is_connected());
        Ok(())
    }

    #[tokio::test]
    async fn test_sqlite_not_connected() {
        let db = SqliteDatabase::new();
        assert!(matches!(
            db.execute("SELECT 1").await,
            Err(DatabaseError::ConnectionError(_))
        ));
        assert!(db.prepare_statement("SELECT 1").is_err());
    }
}
