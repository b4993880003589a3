//! Database trait and connection management
//!
//! This module defines the connection capability every backend implements, and the
//! builder used to configure one.

use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::statement::PreparedStatement;
use super::value::{DatabaseResult, DatabaseValue};
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Default timeout for database operations (30 seconds)
pub const DEFAULT_OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Core database trait that all database backends must implement
///
/// The trait is object-safe, so `Box<dyn Database>` and `Arc<dyn Database>` work.
#[async_trait]
pub trait Database: Send + Sync {
    /// Get the database type
    fn database_type(&self) -> DatabaseType;

    /// Connect to the database with the given connection string
    ///
    /// Any existing connection is closed first. The connection string is kept
    /// for [`Database::reconnect`].
    async fn connect(&self, connection_string: &str) -> Result<()>;

    /// Check if connected to the database
    fn is_connected(&self) -> bool;

    /// Disconnect from the database
    async fn disconnect(&self) -> Result<()>;

    /// Re-open the connection using the last connection string
    ///
    /// When already connected this is a no-op unless `force` is set, in which case
    /// the open connection is closed and replaced.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if `connect` was never called
    async fn reconnect(&self, force: bool) -> Result<()>;

    /// Execute a query that doesn't return results (INSERT, UPDATE, DELETE, CREATE, etc.)
    ///
    /// # Security Warning
    ///
    /// **SQL Injection Risk**: This method executes raw SQL without parameter binding.
    /// Build user-supplied values into a [`PreparedStatement`] instead:
    ///
    /// ```ignore
    /// // UNSAFE - vulnerable to SQL injection
    /// db.execute(&format!("DELETE FROM users WHERE name = '{}'", user_input)).await?;
    ///
    /// // SAFE - value travels as a bound parameter
    /// let raw = Where::new(registry).key("name").equal(user_input)?.build_as_raw();
    /// let stmt = StatementAssembler::assemble(&db, "DELETE FROM users", &raw)?;
    /// db.execute_update(&stmt).await?;
    /// ```
    async fn execute(&self, query: &str) -> Result<u64>;

    /// Execute a SELECT query and return results
    ///
    /// # Security Warning
    ///
    /// **SQL Injection Risk**: This method executes raw SQL without parameter binding.
    /// See [`Database::execute`].
    async fn query(&self, query: &str) -> Result<DatabaseResult>;

    /// Execute a query with `?` placeholders bound positionally to `params`
    async fn query_with_params(
        &self,
        query: &str,
        params: &[DatabaseValue],
    ) -> Result<DatabaseResult>;

    /// Execute a statement with `?` placeholders bound positionally to `params`
    async fn execute_with_params(&self, query: &str, params: &[DatabaseValue]) -> Result<u64>;

    /// Prepare `sql` for parameter binding
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` when not connected
    fn prepare_statement(&self, sql: &str) -> Result<PreparedStatement> {
        if !self.is_connected() {
            return Err(DatabaseError::connection("Not connected to database"));
        }
        Ok(PreparedStatement::new(sql))
    }

    /// Run a prepared query and return its rows
    ///
    /// # Errors
    ///
    /// Returns `UnboundParameter` if any placeholder has no value
    async fn execute_query(&self, statement: &PreparedStatement) -> Result<DatabaseResult> {
        let params = statement.parameters()?;
        self.query_with_params(statement.sql(), &params).await
    }

    /// Run a prepared statement and return the number of affected rows
    ///
    /// # Errors
    ///
    /// Returns `UnboundParameter` if any placeholder has no value
    async fn execute_update(&self, statement: &PreparedStatement) -> Result<u64> {
        let params = statement.parameters()?;
        self.execute_with_params(statement.sql(), &params).await
    }
}

/// Database connection builder
#[derive(Debug, Clone)]
pub struct ConnectionBuilder {
    db_type: DatabaseType,
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    options: HashMap<String, String>,
    operation_timeout: Duration,
}

impl ConnectionBuilder {
    /// Create a new connection builder for the specified database type
    pub fn new(db_type: DatabaseType) -> Self {
        Self {
            db_type,
            host: None,
            port: None,
            database: None,
            username: None,
            password: None,
            options: HashMap::new(),
            operation_timeout: DEFAULT_OPERATION_TIMEOUT,
        }
    }

    /// Set the database host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the database port
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Set the database name (the file path for SQLite)
    pub fn database<S: Into<String>>(mut self, database: S) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the username
    pub fn username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set the password
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Add a custom option
    pub fn option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Set the per-operation timeout
    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// The database type this builder targets
    pub fn database_type(&self) -> DatabaseType {
        self.db_type
    }

    /// The configured per-operation timeout
    pub fn timeout(&self) -> Duration {
        self.operation_timeout
    }

    /// Build the connection string
    pub fn build_connection_string(&self) -> String {
        match self.db_type {
            DatabaseType::Sqlite => self
                .database
                .clone()
                .unwrap_or_else(|| ":memory:".to_string()),
            DatabaseType::Postgres => {
                let mut parts = Vec::new();
                if let Some(host) = &self.host {
                    parts.push(format!("host={}", host));
                }
                if let Some(port) = self.port {
                    parts.push(format!("port={}", port));
                }
                if let Some(database) = &self.database {
                    parts.push(format!("dbname={}", database));
                }
                if let Some(username) = &self.username {
                    parts.push(format!("user={}", username));
                }
                if let Some(password) = &self.password {
                    parts.push(format!("password={}", password));
                }
                let mut options: Vec<_> = self.options.iter().collect();
                options.sort();
                for (key, value) in options {
                    parts.push(format!("{}={}", key, value));
                }
                parts.join(" ")
            }
            DatabaseType::Mysql => {
                let host = self.host.as_deref().unwrap_or("localhost");
                let port = self
                    .port
                    .or_else(|| self.db_type.default_port())
                    .unwrap_or(3306);
                let database = self.database.as_deref().unwrap_or("");
                let username = self.username.as_deref().unwrap_or("root");
                let password = self.password.as_deref().unwrap_or("");
                let mut url = format!(
                    "mysql://{}:{}@{}:{}/{}",
                    username, password, host, port, database
                );
                if !self.options.is_empty() {
                    let mut options: Vec<_> = self
                        .options
                        .iter()
                        .map(|(k, v)| format!("{}={}", k, v))
                        .collect();
                    options.sort();
                    url.push('?');
                    url.push_str(&options.join("&"));
                }
                url
            }
            DatabaseType::None => String::new(),
        }
    }
}
