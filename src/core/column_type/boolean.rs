use super::{mismatch, read_column, ColumnFlags, ColumnType, SqlCode};
use crate::core::error::Result;
use crate::core::statement::PreparedStatement;
use crate::core::value::{DatabaseRow, DatabaseValue, ValueKind};

/// `BIT(1)` storing `true`/`false`
#[derive(Debug, Clone, Default)]
pub struct Boolean;

impl Boolean {
    pub fn new() -> Self {
        Self
    }
}

impl ColumnType for Boolean {
    fn name(&self) -> &'static str {
        "BIT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Bool
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Boolean
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_primary_key: true,
            allow_not_null: true,
            allow_unique: true,
            is_unsigned: false,
            allow_zero_fill: false,
            allow_auto_increment: false,
            allow_default: true,
        }
    }

    fn declaration(&self) -> String {
        "BIT(1)".to_string()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        match value {
            DatabaseValue::Null | DatabaseValue::Bool(_) => statement.set(index, value.clone()),
            other => Err(mismatch(self, other)),
        }
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        // Drivers without a boolean type hand back 0/1 integers or BIT bytes
        let Some(value) = read_column(row, column)? else {
            return Ok(None);
        };
        let decoded = match value {
            DatabaseValue::Bytes(bits) if bits.len() == 1 => Some(bits[0] != 0),
            other => other.as_bool(),
        };
        decoded
            .map(|b| Some(DatabaseValue::Bool(b)))
            .ok_or_else(|| mismatch(self, value))
    }
}
