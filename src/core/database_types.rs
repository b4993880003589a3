//! Database type definitions
//!
//! This module defines the relational backends supported by the system and the
//! small amount of operator syntax that differs between them.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported database types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
#[derive(Default)]
pub enum DatabaseType {
    /// No database type specified
    #[default]
    None = 0,
    /// PostgreSQL database
    Postgres = 1,
    /// MySQL/MariaDB database
    Mysql = 2,
    /// SQLite database
    Sqlite = 3,
}

impl DatabaseType {
    /// Convert database type to string representation
    pub fn to_str(&self) -> &'static str {
        match self {
            DatabaseType::None => "none",
            DatabaseType::Postgres => "postgres",
            DatabaseType::Mysql => "mysql",
            DatabaseType::Sqlite => "sqlite",
        }
    }

    /// Default port for network backends
    pub fn default_port(&self) -> Option<u16> {
        match self {
            DatabaseType::Postgres => Some(5432),
            DatabaseType::Mysql => Some(3306),
            DatabaseType::None | DatabaseType::Sqlite => None,
        }
    }

    /// Null-safe equality operator.
    ///
    /// `None` renders the MySQL form.
    pub fn null_safe_equal(&self) -> &'static str {
        match self {
            DatabaseType::Postgres => "IS NOT DISTINCT FROM",
            DatabaseType::Sqlite => "IS",
            DatabaseType::Mysql | DatabaseType::None => "<=>",
        }
    }

    /// Test for the boolean UNKNOWN truth value
    pub fn is_unknown(&self) -> &'static str {
        match self {
            // SQLite has no UNKNOWN literal; a NULL boolean is unknown
            DatabaseType::Sqlite => "IS NULL",
            _ => "IS UNKNOWN",
        }
    }
}

impl std::fmt::Display for DatabaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for DatabaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(DatabaseType::None),
            "postgres" | "postgresql" => Ok(DatabaseType::Postgres),
            "mysql" | "mariadb" => Ok(DatabaseType::Mysql),
            "sqlite" | "sqlite3" => Ok(DatabaseType::Sqlite),
            _ => Err(format!("Invalid database type: '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_type_to_str() {
        assert_eq!(DatabaseType::Postgres.to_str(), "postgres");
        assert_eq!(DatabaseType::Mysql.to_str(), "mysql");
        assert_eq!(DatabaseType::Sqlite.to_str(), "sqlite");
    }

    #[test]
    fn test_database_type_from_str() {
        assert_eq!(
            "postgresql".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Postgres)
        );
        assert_eq!(
            "mariadb".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Mysql)
        );
        assert_eq!(
            "sqlite3".parse::<DatabaseType>().ok(),
            Some(DatabaseType::Sqlite)
        );
        assert_eq!("redis".parse::<DatabaseType>().ok(), None);
    }

    #[test]
    fn test_operator_dialect() {
        assert_eq!(DatabaseType::Mysql.null_safe_equal(), "<=>");
        assert_eq!(DatabaseType::None.null_safe_equal(), "<=>");
        assert_eq!(DatabaseType::Sqlite.null_safe_equal(), "IS");
        assert_eq!(
            DatabaseType::Postgres.null_safe_equal(),
            "IS NOT DISTINCT FROM"
        );
        assert_eq!(DatabaseType::Sqlite.is_unknown(), "IS NULL");
        assert_eq!(DatabaseType::Mysql.is_unknown(), "IS UNKNOWN");
    }

    #[test]
    fn test_default_port() {
        assert_eq!(DatabaseType::Postgres.default_port(), Some(5432));
        assert_eq!(DatabaseType::Mysql.default_port(), Some(3306));
        assert_eq!(DatabaseType::Sqlite.default_port(), None);
    }
}
