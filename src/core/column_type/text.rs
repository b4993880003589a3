use super::{mismatch, read_column, ColumnFlags, ColumnType, SqlCode};
use crate::core::error::Result;
use crate::core::statement::PreparedStatement;
use crate::core::value::{DatabaseRow, DatabaseValue, ValueKind};

/// Fixed-width `CHAR(n)`, strings only
#[derive(Debug, Clone)]
pub struct Char {
    length: u32,
}

impl Char {
    pub fn new(length: u32) -> Self {
        Self { length }
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}

impl Default for Char {
    fn default() -> Self {
        Self::new(255)
    }
}

impl ColumnType for Char {
    fn name(&self) -> &'static str {
        "CHAR"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Char
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_primary_key: true,
            allow_not_null: true,
            allow_unique: true,
            allow_default: true,
            ..ColumnFlags::default()
        }
    }

    fn declaration(&self) -> String {
        format!("CHAR({})", self.length)
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        match value {
            DatabaseValue::Null | DatabaseValue::String(_) => statement.set(index, value.clone()),
            other => Err(mismatch(self, other)),
        }
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        match read_column(row, column)? {
            None => Ok(None),
            Some(DatabaseValue::Bytes(bytes)) => Ok(Some(DatabaseValue::String(
                String::from_utf8_lossy(bytes).into_owned(),
            ))),
            Some(value) => Ok(Some(DatabaseValue::String(value.as_string()))),
        }
    }
}

/// `TEXT`: accepts any scalar and stores its string form
#[derive(Debug, Clone)]
pub struct Text {
    length: u32,
}

impl Text {
    pub fn new(length: u32) -> Self {
        Self { length }
    }

    pub fn length(&self) -> u32 {
        self.length
    }
}

impl ColumnType for Text {
    fn name(&self) -> &'static str {
        "TEXT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::String
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::VarChar
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_not_null: true,
            allow_unique: true,
            allow_default: true,
            ..ColumnFlags::default()
        }
    }

    fn declaration(&self) -> String {
        format!("TEXT({})", self.length)
    }

    // CHAR wins plain strings
    fn priority(&self) -> i32 {
        12
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        !matches!(value, DatabaseValue::Bytes(_))
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        match value {
            DatabaseValue::Null => statement.set_null(index),
            DatabaseValue::Bytes(_) => Err(mismatch(self, value)),
            DatabaseValue::String(_) => statement.set(index, value.clone()),
            other => statement.set(index, DatabaseValue::String(other.as_string())),
        }
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        match read_column(row, column)? {
            None => Ok(None),
            Some(DatabaseValue::Bytes(bytes)) => Ok(Some(DatabaseValue::String(
                String::from_utf8_lossy(bytes).into_owned(),
            ))),
            Some(value) => Ok(Some(DatabaseValue::String(value.as_string()))),
        }
    }
}
