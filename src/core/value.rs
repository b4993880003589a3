//! Database value types
//!
//! This module defines the runtime values that flow between predicate builders,
//! column type codecs and database drivers.

use chrono::NaiveDateTime;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Text layouts accepted when reading a datetime stored as text
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Database value that can hold different types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DatabaseValue {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 16-bit integer
    Short(i16),
    /// 32-bit integer
    Int(i32),
    /// 64-bit integer
    Long(i64),
    /// 32-bit floating point
    Float(f32),
    /// 64-bit floating point
    Double(f64),
    /// Arbitrary-precision decimal
    Decimal(Decimal),
    /// String value
    String(String),
    /// Binary data
    Bytes(Vec<u8>),
    /// Date and time without timezone
    DateTime(NaiveDateTime),
}

/// The runtime kind of a [`DatabaseValue`], used as the registry lookup key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValueKind {
    Null,
    Bool,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Bytes,
    DateTime,
}

impl ValueKind {
    /// Lowercase name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Short => "short",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::Double => "double",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
            ValueKind::DateTime => "datetime",
        }
    }

    /// Check if this kind holds a number
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Short
                | ValueKind::Int
                | ValueKind::Long
                | ValueKind::Float
                | ValueKind::Double
                | ValueKind::Decimal
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DatabaseValue {
    /// Get the runtime kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            DatabaseValue::Null => ValueKind::Null,
            DatabaseValue::Bool(_) => ValueKind::Bool,
            DatabaseValue::Short(_) => ValueKind::Short,
            DatabaseValue::Int(_) => ValueKind::Int,
            DatabaseValue::Long(_) => ValueKind::Long,
            DatabaseValue::Float(_) => ValueKind::Float,
            DatabaseValue::Double(_) => ValueKind::Double,
            DatabaseValue::Decimal(_) => ValueKind::Decimal,
            DatabaseValue::String(_) => ValueKind::String,
            DatabaseValue::Bytes(_) => ValueKind::Bytes,
            DatabaseValue::DateTime(_) => ValueKind::DateTime,
        }
    }

    /// Get the value as a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DatabaseValue::Bool(v) => Some(*v),
            DatabaseValue::Short(v) => Some(*v != 0),
            DatabaseValue::Int(v) => Some(*v != 0),
            DatabaseValue::Long(v) => Some(*v != 0),
            DatabaseValue::String(s) => match s.to_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Get the value as an i64, truncating fractional numbers
    pub fn as_long(&self) -> Option<i64> {
        match self {
            DatabaseValue::Long(v) => Some(*v),
            DatabaseValue::Int(v) => Some(*v as i64),
            DatabaseValue::Short(v) => Some(*v as i64),
            DatabaseValue::Float(v) => Some(*v as i64),
            DatabaseValue::Double(v) => Some(*v as i64),
            DatabaseValue::Decimal(v) => v.trunc().to_i64(),
            DatabaseValue::String(s) => s.parse().ok(),
            DatabaseValue::Bool(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Get the value as an f64
    pub fn as_double(&self) -> Option<f64> {
        match self {
            DatabaseValue::Double(v) => Some(*v),
            DatabaseValue::Float(v) => Some(*v as f64),
            DatabaseValue::Short(v) => Some(*v as f64),
            DatabaseValue::Int(v) => Some(*v as f64),
            DatabaseValue::Long(v) => Some(*v as f64),
            DatabaseValue::Decimal(v) => v.to_f64(),
            DatabaseValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Get the value as a decimal
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            DatabaseValue::Decimal(v) => Some(*v),
            DatabaseValue::Short(v) => Some(Decimal::from(*v)),
            DatabaseValue::Int(v) => Some(Decimal::from(*v)),
            DatabaseValue::Long(v) => Some(Decimal::from(*v)),
            DatabaseValue::Float(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::Double(v) => Decimal::try_from(*v).ok(),
            DatabaseValue::String(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    /// Get the value as a datetime, parsing text and reading integers as unix seconds
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            DatabaseValue::DateTime(v) => Some(*v),
            DatabaseValue::String(s) => parse_datetime(s),
            DatabaseValue::Long(secs) => {
                chrono::DateTime::from_timestamp(*secs, 0).map(|dt| dt.naive_utc())
            }
            _ => None,
        }
    }

    /// Get the value as a string (zero-copy for String values)
    pub fn as_str(&self) -> Option<&str> {
        match self {
            DatabaseValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get the value as a string (with conversion)
    pub fn as_string(&self) -> String {
        match self {
            DatabaseValue::Null => "null".to_string(),
            DatabaseValue::Bool(v) => v.to_string(),
            DatabaseValue::Short(v) => v.to_string(),
            DatabaseValue::Int(v) => v.to_string(),
            DatabaseValue::Long(v) => v.to_string(),
            DatabaseValue::Float(v) => v.to_string(),
            DatabaseValue::Double(v) => v.to_string(),
            DatabaseValue::Decimal(v) => v.to_string(),
            DatabaseValue::String(s) => s.clone(),
            DatabaseValue::Bytes(b) => format!("<{} bytes>", b.len()),
            DatabaseValue::DateTime(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
        }
    }

    /// Get the value as bytes (zero-copy)
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            DatabaseValue::Bytes(b) => Some(b),
            DatabaseValue::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, DatabaseValue::Null)
    }

    /// Get the type name of this value
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

impl From<bool> for DatabaseValue {
    fn from(v: bool) -> Self {
        DatabaseValue::Bool(v)
    }
}

impl From<i16> for DatabaseValue {
    fn from(v: i16) -> Self {
        DatabaseValue::Short(v)
    }
}

impl From<u16> for DatabaseValue {
    fn from(v: u16) -> Self {
        DatabaseValue::Int(v as i32)
    }
}

impl From<i32> for DatabaseValue {
    fn from(v: i32) -> Self {
        DatabaseValue::Int(v)
    }
}

impl From<i64> for DatabaseValue {
    fn from(v: i64) -> Self {
        DatabaseValue::Long(v)
    }
}

impl From<u64> for DatabaseValue {
    fn from(v: u64) -> Self {
        DatabaseValue::Decimal(Decimal::from(v))
    }
}

impl From<f32> for DatabaseValue {
    fn from(v: f32) -> Self {
        DatabaseValue::Float(v)
    }
}

impl From<f64> for DatabaseValue {
    fn from(v: f64) -> Self {
        DatabaseValue::Double(v)
    }
}

impl From<Decimal> for DatabaseValue {
    fn from(v: Decimal) -> Self {
        DatabaseValue::Decimal(v)
    }
}

impl From<String> for DatabaseValue {
    fn from(v: String) -> Self {
        DatabaseValue::String(v)
    }
}

impl From<&str> for DatabaseValue {
    fn from(v: &str) -> Self {
        DatabaseValue::String(v.to_string())
    }
}

impl From<Vec<u8>> for DatabaseValue {
    fn from(v: Vec<u8>) -> Self {
        DatabaseValue::Bytes(v)
    }
}

impl From<NaiveDateTime> for DatabaseValue {
    fn from(v: NaiveDateTime) -> Self {
        DatabaseValue::DateTime(v)
    }
}

impl<T: Into<DatabaseValue>> From<Option<T>> for DatabaseValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => DatabaseValue::Null,
        }
    }
}

/// A row of database results (column name -> value mapping)
pub type DatabaseRow = HashMap<String, DatabaseValue>;

/// Multiple rows returned from a query
pub type DatabaseResult = Vec<DatabaseRow>;
