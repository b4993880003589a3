use super::{mismatch, read_column, ColumnFlags, ColumnType, SqlCode};
use crate::core::error::Result;
use crate::core::statement::PreparedStatement;
use crate::core::value::{DatabaseRow, DatabaseValue, ValueKind};
use chrono::NaiveDateTime;
use std::fmt;

/// Default expression for a `DATETIME` column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDefault {
    /// `CURRENT_TIMESTAMP`
    CurrentTimestamp,
    /// A fixed point in time
    Literal(NaiveDateTime),
}

impl fmt::Display for DateDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateDefault::CurrentTimestamp => f.write_str("CURRENT_TIMESTAMP"),
            DateDefault::Literal(at) => write!(f, "'{}'", at.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// `DATETIME` with an optional column default
#[derive(Debug, Clone, Default)]
pub struct DateTime {
    default: Option<DateDefault>,
}

impl DateTime {
    pub fn new(default: Option<DateDefault>) -> Self {
        Self { default }
    }

    pub fn default_value(&self) -> Option<DateDefault> {
        self.default
    }
}

impl ColumnType for DateTime {
    fn name(&self) -> &'static str {
        "DATETIME"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::DateTime
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Timestamp
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_not_null: true,
            allow_default: true,
            ..ColumnFlags::default()
        }
    }

    fn default_literal(&self) -> Option<String> {
        self.default.map(|d| d.to_string())
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        match value {
            DatabaseValue::Null | DatabaseValue::DateTime(_) => {
                statement.set(index, value.clone())
            }
            other => Err(mismatch(self, other)),
        }
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        let Some(value) = read_column(row, column)? else {
            return Ok(None);
        };
        value
            .as_datetime()
            .map(|at| Some(DatabaseValue::DateTime(at)))
            .ok_or_else(|| mismatch(self, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::tests::row_of;
    use crate::core::error::DatabaseError;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_default_literal() {
        assert_eq!(DateTime::new(None).default_literal(), None);
        assert_eq!(
            DateTime::new(Some(DateDefault::CurrentTimestamp)).default_literal(),
            Some("CURRENT_TIMESTAMP".to_string())
        );
        assert_eq!(
            DateTime::new(Some(DateDefault::Literal(sample()))).default_literal(),
            Some("'2024-03-09 14:30:00'".to_string())
        );
    }

    #[test]
    fn test_encode_is_strict() {
        let mut stmt = PreparedStatement::new("SELECT ?");
        let codec = DateTime::new(None);
        codec
            .encode(&mut stmt, 1, &DatabaseValue::DateTime(sample()))
            .unwrap();
        assert!(matches!(
            codec
                .encode(&mut stmt, 1, &DatabaseValue::from("2024-03-09"))
                .unwrap_err(),
            DatabaseError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_decode_parses_text() {
        let codec = DateTime::new(None);
        let row = row_of("at", DatabaseValue::from("2024-03-09 14:30:00"));
        assert_eq!(
            codec.decode(&row, "at").unwrap(),
            Some(DatabaseValue::DateTime(sample()))
        );
        let row = row_of("at", DatabaseValue::from("not a date"));
        assert!(codec.decode(&row, "at").is_err());
    }
}
