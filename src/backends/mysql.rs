//! MySQL database backend implementation
//!
//! This module provides a MySQL/MariaDB implementation of the Database trait using
//! mysql_async. Parameterized calls go through the binary protocol, so rows come
//! back typed; raw `query` uses the text protocol and returns strings.

use crate::core::{
    database::{Database, DEFAULT_OPERATION_TIMEOUT},
    database_types::DatabaseType,
    error::{DatabaseError, Result},
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Timelike};
use mysql_async::prelude::Queryable;
use mysql_async::{Conn, Opts, Params, Row, Value};
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Character set id MySQL reports for binary columns
const BINARY_CHARSET: u16 = 63;

/// MySQL database implementation
pub struct MysqlDatabase {
    conn: Arc<Mutex<Option<Conn>>>,
    connected: AtomicBool,
    connection_string: SyncMutex<Option<String>>,
    operation_timeout: Duration,
}

impl MysqlDatabase {
    /// Create a new MySQL database instance
    pub fn new() -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            connected: AtomicBool::new(false),
            connection_string: SyncMutex::new(None),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Replace the per-operation timeout
    pub fn with_operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// Convert a mysql_async Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> DatabaseRow {
        let mut db_row = DatabaseRow::new();

        for (idx, column) in row.columns_ref().iter().enumerate() {
            let binary = column.character_set() == BINARY_CHARSET;
            let value = match row.as_ref(idx) {
                None | Some(Value::NULL) => DatabaseValue::Null,
                Some(Value::Int(v)) => DatabaseValue::Long(*v),
                Some(Value::UInt(v)) => match i64::try_from(*v) {
                    Ok(v) => DatabaseValue::Long(v),
                    Err(_) => DatabaseValue::from(*v),
                },
                Some(Value::Float(v)) => DatabaseValue::Float(*v),
                Some(Value::Double(v)) => DatabaseValue::Double(*v),
                Some(Value::Bytes(bytes)) if binary => DatabaseValue::Bytes(bytes.clone()),
                Some(Value::Bytes(bytes)) => {
                    DatabaseValue::String(String::from_utf8_lossy(bytes).into_owned())
                }
                Some(Value::Date(y, mo, d, h, mi, s, us)) => {
                    NaiveDate::from_ymd_opt(i32::from(*y), u32::from(*mo), u32::from(*d))
                        .and_then(|date| {
                            date.and_hms_micro_opt(
                                u32::from(*h),
                                u32::from(*mi),
                                u32::from(*s),
                                *us,
                            )
                        })
                        // Zero dates like 0000-00-00 have no chrono equivalent
                        .map(DatabaseValue::DateTime)
                        .unwrap_or(DatabaseValue::Null)
                }
                Some(time @ Value::Time(..)) => DatabaseValue::String(time.as_sql(true)),
            };
            db_row.insert(column.name_str().into_owned(), value);
        }

        db_row
    }

    /// Convert DatabaseValue to mysql parameter
    fn value_to_param(value: &DatabaseValue) -> Value {
        match value {
            DatabaseValue::Null => Value::NULL,
            DatabaseValue::Bool(v) => Value::Int(i64::from(*v)),
            DatabaseValue::Short(v) => Value::Int(i64::from(*v)),
            DatabaseValue::Int(v) => Value::Int(i64::from(*v)),
            DatabaseValue::Long(v) => Value::Int(*v),
            DatabaseValue::Float(v) => Value::Float(*v),
            DatabaseValue::Double(v) => Value::Double(*v),
            DatabaseValue::Decimal(v) => Value::Bytes(v.to_string().into_bytes()),
            DatabaseValue::String(v) => Value::Bytes(v.clone().into_bytes()),
            DatabaseValue::Bytes(v) => Value::Bytes(v.clone()),
            DatabaseValue::DateTime(v) => Value::Date(
                v.year() as u16,
                v.month() as u8,
                v.day() as u8,
                v.hour() as u8,
                v.minute() as u8,
                v.second() as u8,
                v.nanosecond() / 1_000,
            ),
        }
    }

    fn to_params(params: &[DatabaseValue]) -> Params {
        if params.is_empty() {
            Params::Empty
        } else {
            Params::Positional(params.iter().map(Self::value_to_param).collect())
        }
    }

    fn timeout_error(&self) -> DatabaseError {
        DatabaseError::query_timeout(self.operation_timeout.as_millis() as u64)
    }
}

impl Default for MysqlDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for MysqlDatabase {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Mysql
    }

    async fn connect(&self, connection_string: &str) -> Result<()> {
        // Clean up any existing connection first
        self.disconnect().await?;
        *self.connection_string.lock() = Some(connection_string.to_string());

        let opts = Opts::from_url(connection_string)
            .map_err(|e| DatabaseError::InvalidConnectionString(e.to_string()))?;

        let conn = tokio::time::timeout(self.operation_timeout, Conn::new(opts))
            .await
            .map_err(|_| {
                DatabaseError::connection_timeout(self.operation_timeout.as_millis() as u64)
            })?
            .map_err(|e| DatabaseError::connection(e.to_string()))?;

        *self.conn.lock().await = Some(conn);
        self.connected.store(true, Ordering::SeqCst);
        info!("connected to MySQL");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        let conn = self.conn.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        if let Some(conn) = conn {
            if let Err(e) = conn.disconnect().await {
                warn!(error = %e, "MySQL connection did not close cleanly");
            } else {
                debug!("closed MySQL connection");
            }
        }
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
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        tokio::time::timeout(self.operation_timeout, conn.query_drop(query))
            .await
            .map_err(|_| self.timeout_error())??;
        Ok(conn.affected_rows())
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        let rows: Vec<Row> = tokio::time::timeout(self.operation_timeout, conn.query(query))
            .await
            .map_err(|_| self.timeout_error())??;
        Ok(rows.iter().map(Self::row_to_database_row).collect())
    }

    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        let rows: Vec<Row> = tokio::time::timeout(
            self.operation_timeout,
            conn.exec(query, Self::to_params(params)),
        )
        .await
        .map_err(|_| self.timeout_error())??;
        Ok(rows.iter().map(Self::row_to_database_row).collect())
    }

    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        tokio::time::timeout(
            self.operation_timeout,
            conn.exec_drop(query, Self::to_params(params)),
        )
        .await
        .map_err(|_| self.timeout_error())??;
        Ok(conn.affected_rows())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::TypeRegistry;
    use crate::core::statement::StatementAssembler;
    use crate::core::where_builder::{Where, WhereClause};

    fn get_mysql_url() -> Option<String> {
        std::env::var("MYSQL_URL").ok()
    }

    #[test]
    fn test_value_to_param() {
        let at = NaiveDate::from_ymd_opt(2024, 5, 6)
            .and_then(|d| d.and_hms_micro_opt(7, 8, 9, 10))
            .unwrap();
        assert_eq!(
            MysqlDatabase::value_to_param(&DatabaseValue::DateTime(at)),
            Value::Date(2024, 5, 6, 7, 8, 9, 10)
        );
        assert_eq!(
            MysqlDatabase::value_to_param(&DatabaseValue::from(u64::MAX)),
            Value::Bytes(b"18446744073709551615".to_vec())
        );
        assert_eq!(
            MysqlDatabase::value_to_param(&DatabaseValue::Bool(true)),
            Value::Int(1)
        );
        assert!(matches!(MysqlDatabase::to_params(&[]), Params::Empty));
    }

    #[tokio::test]
    async fn test_mysql_invalid_url() {
        let db = MysqlDatabase::new();
        assert!(matches!(
            db.connect("not a url").await,
            Err(DatabaseError::InvalidConnectionString(_))
        ));
        assert!(!db.is_connected());
    }

    #[tokio::test]
    #[ignore] // Run with: cargo test --features mysql -- --ignored
    async fn test_mysql_assembled_query() -> Result<()> {
        let url = match get_mysql_url() {
            Some(url) => url,
            None => {
                eprintln!("Skipping test: MYSQL_URL not set");
                return Ok(());
            }
        };

        let db = MysqlDatabase::new();
        db.connect(&url).await?;

        db.execute("DROP TABLE IF EXISTS test_where").await?;
        db.execute(
            "CREATE TABLE test_where (id INT AUTO_INCREMENT PRIMARY KEY, name CHAR(32), age SMALLINT)",
        )
        .await?;
        db.execute("INSERT INTO test_where (name, age) VALUES ('Alice', 30), ('Bob', 17)")
            .await?;

        let registry = Arc::new(TypeRegistry::with_builtins());
        let raw = Where::new(registry)
            .key("age")
            .greater_or_equals(18i16)?
            .and("name")
            .equal("Alice")?
            .build_as_raw();
        let stmt = StatementAssembler::assemble(&db, "SELECT name FROM test_where", &raw)?;
        let rows = db.execute_query(&stmt).await?;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&DatabaseValue::from("Alice")));

        db.execute("DROP TABLE test_where").await?;
        db.disconnect().await?;
        Ok(())
    }
}
