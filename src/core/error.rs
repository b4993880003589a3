//! Error types for the query system
//!
//! This module defines all error types that can occur while building predicates,
//! binding values and talking to a database driver.

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Error types for database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Connection error (generic)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Connection timeout
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout { timeout_ms: u64 },

    /// Query execution error
    #[error("Query execution error: {0}")]
    QueryError(String),

    /// Query timeout
    #[error("Query timeout after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// A value does not match the native type a column type encodes
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// A value is outside the representable range of a column type
    #[error("{type_name} can only store values within {min}..={max}, got {value}")]
    RangeError {
        type_name: String,
        value: String,
        min: String,
        max: String,
    },

    /// No registered column type handles the value's kind
    #[error("No column type registered for values of kind {kind}")]
    NoTypeMapping { kind: String },

    /// A column declaration requests something its column type does not allow
    #[error("Invalid column `{column}`: {reason}")]
    InvalidColumn { column: String, reason: String },

    /// A parameter index outside `1..=count`
    #[error("Parameter index {index} out of range (statement has {count} parameters)")]
    ParameterIndex { index: usize, count: usize },

    /// A placeholder was never bound before execution
    #[error("Parameter {index} was not bound")]
    UnboundParameter { index: usize },

    /// Invalid connection string
    #[error("Invalid connection string: {0}")]
    InvalidConnectionString(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// Unsupported operation
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// SQLite error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    /// PostgreSQL error
    #[cfg(feature = "postgres")]
    #[error("PostgreSQL error: {0}")]
    PostgresError(#[from] tokio_postgres::Error),

    /// MySQL error
    #[cfg(feature = "mysql")]
    #[error("MySQL error: {0}")]
    MysqlError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DatabaseError {
    /// Create a new connection error (generic)
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        DatabaseError::ConnectionError(msg.into())
    }

    /// Create a connection timeout error
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        DatabaseError::ConnectionTimeout { timeout_ms }
    }

    /// Create a new query error
    pub fn query<S: Into<String>>(msg: S) -> Self {
        DatabaseError::QueryError(msg.into())
    }

    /// Create a query timeout error
    pub fn query_timeout(timeout_ms: u64) -> Self {
        DatabaseError::QueryTimeout { timeout_ms }
    }

    /// Create a new type mismatch error
    pub fn type_mismatch(expected: &str, actual: &str) -> Self {
        DatabaseError::TypeMismatch {
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Create a range error for `value` against the inclusive bounds `min..=max`
    pub fn range(
        type_name: &str,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
    ) -> Self {
        DatabaseError::RangeError {
            type_name: type_name.to_string(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
        }
    }

    /// Create a missing type mapping error
    pub fn no_type_mapping(kind: impl ToString) -> Self {
        DatabaseError::NoTypeMapping {
            kind: kind.to_string(),
        }
    }

    /// Create an invalid column declaration error
    pub fn invalid_column(column: impl Into<String>, reason: impl Into<String>) -> Self {
        DatabaseError::InvalidColumn {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported operation error
    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        DatabaseError::UnsupportedOperation(msg.into())
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        DatabaseError::Other(msg.into())
    }

    /// True for the errors a codec raises while encoding or inferring a value
    pub fn is_binding_error(&self) -> bool {
        matches!(
            self,
            DatabaseError::TypeMismatch { .. }
                | DatabaseError::RangeError { .. }
                | DatabaseError::NoTypeMapping { .. }
        )
    }
}

#[cfg(feature = "mysql")]
impl From<mysql_async::Error> for DatabaseError {
    fn from(err: mysql_async::Error) -> Self {
        DatabaseError::MysqlError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = DatabaseError::connection("Failed to connect");
        assert!(matches!(err, DatabaseError::ConnectionError(_)));

        let err = DatabaseError::query("Invalid SQL");
        assert!(matches!(err, DatabaseError::QueryError(_)));

        let err = DatabaseError::type_mismatch("i16", "String");
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));
        assert!(err.is_binding_error());

        let err = DatabaseError::invalid_column("body", "TEXT cannot be a primary key");
        assert!(!err.is_binding_error());
    }

    #[test]
    fn test_error_display() {
        let err = DatabaseError::connection("Connection refused");
        assert_eq!(err.to_string(), "Connection error: Connection refused");

        let err = DatabaseError::type_mismatch("i64", "f64");
        assert_eq!(err.to_string(), "Type mismatch: expected i64, got f64");

        let err = DatabaseError::range("UBIGINT", -1, 0, u64::MAX);
        assert_eq!(
            err.to_string(),
            "UBIGINT can only store values within 0..=18446744073709551615, got -1"
        );

        let err = DatabaseError::ParameterIndex { index: 3, count: 2 };
        assert_eq!(
            err.to_string(),
            "Parameter index 3 out of range (statement has 2 parameters)"
        );
    }
}
