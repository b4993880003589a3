//! PostgreSQL database backend implementation
//!
//! This module provides a PostgreSQL implementation of the Database trait using
//! tokio-postgres. Statements are written with `?` placeholders like every other
//! backend and rewritten to `$1, $2, ...` before they reach the server.

use crate::core::{
    database::{Database, DEFAULT_OPERATION_TIMEOUT},
    database_types::DatabaseType,
    error::{DatabaseError, Result},
    statement::number_placeholders,
    value::{DatabaseResult, DatabaseRow, DatabaseValue},
};
use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_postgres::types::ToSql;
use tokio_postgres::{Client, NoTls, Row};
use tracing::{error, info};

/// PostgreSQL database implementation
pub struct PostgresDatabase {
    client: Arc<Mutex<Option<Client>>>,
    connected: Arc<AtomicBool>,
    connection_string: SyncMutex<Option<String>>,
    operation_timeout: Duration,
}

impl PostgresDatabase {
    /// Create a new PostgreSQL database instance
    pub fn new() -> Self {
        Self {
            client: Arc::new(Mutex::new(None)),
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

    /// Convert a tokio_postgres Row to a DatabaseRow
    fn row_to_database_row(row: &Row) -> Result<DatabaseRow> {
        let mut db_row = DatabaseRow::new();

        for (idx, column) in row.columns().iter().enumerate() {
            let column_name = column.name().to_string();
            let value = match column.type_().name() {
                "bool" => row
                    .try_get::<_, Option<bool>>(idx)?
                    .map(DatabaseValue::Bool),
                "int2" => row
                    .try_get::<_, Option<i16>>(idx)?
                    .map(DatabaseValue::Short),
                "int4" => row
                    .try_get::<_, Option<i32>>(idx)?
                    .map(DatabaseValue::Int),
                "int8" => row
                    .try_get::<_, Option<i64>>(idx)?
                    .map(DatabaseValue::Long),
                "float4" => row
                    .try_get::<_, Option<f32>>(idx)?
                    .map(DatabaseValue::Float),
                "float8" => row
                    .try_get::<_, Option<f64>>(idx)?
                    .map(DatabaseValue::Double),
                "numeric" => row
                    .try_get::<_, Option<rust_decimal::Decimal>>(idx)?
                    .map(DatabaseValue::Decimal),
                "bytea" => row
                    .try_get::<_, Option<Vec<u8>>>(idx)?
                    .map(DatabaseValue::Bytes),
                "timestamp" => row
                    .try_get::<_, Option<chrono::NaiveDateTime>>(idx)?
                    .map(DatabaseValue::DateTime),
                "timestamptz" => row
                    .try_get::<_, Option<chrono::DateTime<chrono::Utc>>>(idx)?
                    .map(|at| DatabaseValue::DateTime(at.naive_utc())),
                _ => row
                    .try_get::<_, Option<String>>(idx)?
                    .map(DatabaseValue::String),
            };
            db_row.insert(column_name, value.unwrap_or(DatabaseValue::Null));
        }

        Ok(db_row)
    }

    /// Convert DatabaseValue to postgres parameter
    fn value_to_param(value: &DatabaseValue) -> Box<dyn ToSql + Sync + Send> {
        match value {
            DatabaseValue::Null => Box::new(None::<i64>),
            DatabaseValue::Bool(v) => Box::new(*v),
            DatabaseValue::Short(v) => Box::new(*v),
            DatabaseValue::Int(v) => Box::new(*v),
            DatabaseValue::Long(v) => Box::new(*v),
            DatabaseValue::Float(v) => Box::new(*v),
            DatabaseValue::Double(v) => Box::new(*v),
            DatabaseValue::Decimal(v) => Box::new(*v),
            DatabaseValue::String(v) => Box::new(v.clone()),
            DatabaseValue::Bytes(v) => Box::new(v.clone()),
            DatabaseValue::DateTime(v) => Box::new(*v),
        }
    }

    fn timeout_error(&self) -> DatabaseError {
        DatabaseError::query_timeout(self.operation_timeout.as_millis() as u64)
    }
}

impl Default for PostgresDatabase {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Database for PostgresDatabase {
    fn database_type(&self) -> DatabaseType {
        DatabaseType::Postgres
    }

    async fn connect(&self, connection_string: &str) -> Result<()> {
        // Clean up any existing connection first
        self.disconnect().await?;
        *self.connection_string.lock() = Some(connection_string.to_string());

        let connection_string = connection_string.to_string();
        let client_arc = Arc::clone(&self.client);
        let connected = Arc::clone(&self.connected);

        let connect_future = async move {
            let (client, connection) = tokio_postgres::connect(&connection_string, NoTls)
                .await
                .map_err(|e| DatabaseError::connection(e.to_string()))?;

            // Spawn the connection handler in the background
            let background = Arc::clone(&connected);
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!(error = %e, "PostgreSQL connection error");
                }
                background.store(false, Ordering::SeqCst);
            });

            let mut client_guard = client_arc.lock().await;
            *client_guard = Some(client);
            connected.store(true, Ordering::SeqCst);

            Ok::<(), DatabaseError>(())
        };

        tokio::time::timeout(self.operation_timeout, connect_future)
            .await
            .map_err(|_| {
                DatabaseError::connection_timeout(self.operation_timeout.as_millis() as u64)
            })??;

        info!("connected to PostgreSQL");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn disconnect(&self) -> Result<()> {
        let mut client = self.client.lock().await;
        *client = None;
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
        self.execute_with_params(query, &[]).await
    }

    async fn query(&self, query: &str) -> Result<DatabaseResult> {
        self.query_with_params(query, &[]).await
    }

    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult> {
        let client = self.client.lock().await;
        let client = client
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        let query = number_placeholders(query);
        let postgres_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(Self::value_to_param).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> = postgres_params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let rows = tokio::time::timeout(self.operation_timeout, client.query(&query, &param_refs))
            .await
            .map_err(|_| self.timeout_error())?
            .map_err(|e| DatabaseError::query(e.to_string()))?;

        rows.iter().map(Self::row_to_database_row).collect()
    }

    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64> {
        let client = self.client.lock().await;
        let client = client
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("Not connected to database"))?;

        let query = number_placeholders(query);
        let postgres_params: Vec<Box<dyn ToSql + Sync + Send>> =
            params.iter().map(Self::value_to_param).collect();
        let param_refs: Vec<&(dyn ToSql + Sync)> = postgres_params
            .iter()
            .map(|p| p.as_ref() as &(dyn ToSql + Sync))
            .collect();

        let affected =
            tokio::time::timeout(self.operation_timeout, client.execute(&query, &param_refs))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| DatabaseError::query(e.to_string()))?;

        Ok(affected)
    }
}
