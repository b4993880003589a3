//! Column type codecs
//!
//! A [`ColumnType`] pairs a SQL column type with the [`ValueKind`] it stores. It
//! encodes values into [`PreparedStatement`] parameters, decodes result columns
//! back into values, and declares which constraints a column of its type may carry.
//!
//! Codecs are immutable. The only state a codec holds is its construction-time
//! property (display width, length, or default expression).

mod binary;
mod boolean;
mod datetime;
mod numeric;
mod text;

pub use binary::Blob;
pub use boolean::Boolean;
pub use datetime::{DateDefault, DateTime};
pub use numeric::{BigInt, Double, Integer, SmallInt, UBigInt, USmallInt};
pub use text::{Char, Text};

use super::error::{DatabaseError, Result};
use super::statement::PreparedStatement;
use super::value::{DatabaseRow, DatabaseValue, ValueKind};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Priority given to a codec unless it says otherwise
pub const DEFAULT_PRIORITY: i32 = 10;

/// Driver-level type tags, numbered like JDBC's `java.sql.Types`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum SqlCode {
    Bit = -7,
    BigInt = -5,
    Char = 1,
    Integer = 4,
    SmallInt = 5,
    Double = 8,
    VarChar = 12,
    Boolean = 16,
    Date = 91,
    Timestamp = 93,
    Blob = 2004,
}

impl SqlCode {
    /// Numeric tag
    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Constraints a column of a given type may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColumnFlags {
    pub allow_primary_key: bool,
    pub allow_not_null: bool,
    pub allow_unique: bool,
    pub is_unsigned: bool,
    pub allow_zero_fill: bool,
    pub allow_auto_increment: bool,
    pub allow_default: bool,
}

/// Access to the concrete type behind a trait object
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A SQL column type and the codec for its values
pub trait ColumnType: AsAny + Send + Sync + fmt::Debug {
    /// SQL type keyword, e.g. `SMALLINT`
    fn name(&self) -> &'static str;

    /// The value kind this type encodes from and decodes to
    fn native_kind(&self) -> ValueKind;

    /// Driver-level type tag
    fn sql_code(&self) -> SqlCode;

    /// Constraints a column of this type may declare
    fn flags(&self) -> ColumnFlags;

    /// Type as written in a column declaration, e.g. `SMALLINT(6)`
    fn declaration(&self) -> String {
        self.name().to_string()
    }

    /// Rendering of the column default, if this type carries one
    fn default_literal(&self) -> Option<String> {
        None
    }

    /// Lower sorts first when several types handle the same kind
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    /// Check if `encode` would accept the value's type
    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind() == self.native_kind()
    }

    /// Write `value` into parameter `index` (1-based) of `statement`
    ///
    /// # Errors
    ///
    /// `TypeMismatch` when the value cannot be represented by this type,
    /// `RangeError` for range-checked types, `ParameterIndex` from the statement.
    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()>;

    /// Read `column` from `row`; `None` for SQL NULL
    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>>;
}

/// Identity of the concrete codec type behind `column_type`
pub fn codec_id(column_type: &dyn ColumnType) -> TypeId {
    column_type.as_any().type_id()
}

/// Check if two codecs are the same concrete type, ignoring their properties
pub fn same_codec(a: &dyn ColumnType, b: &dyn ColumnType) -> bool {
    codec_id(a) == codec_id(b)
}

/// One instance of every built-in column type, in registration order
pub fn builtins() -> Vec<Arc<dyn ColumnType>> {
    vec![
        Arc::new(Boolean::new()),
        Arc::new(SmallInt::new(6)),
        Arc::new(USmallInt::new(5)),
        Arc::new(Integer::new(11)),
        Arc::new(BigInt::new(20)),
        Arc::new(UBigInt::new(20)),
        Arc::new(Double::new()),
        Arc::new(Char::default()),
        Arc::new(Text::new(65535)),
        Arc::new(DateTime::new(None)),
        Arc::new(Blob::new()),
    ]
}

/// Fetch `column` from `row`, mapping SQL NULL to `None`
pub(crate) fn read_column<'a>(
    row: &'a DatabaseRow,
    column: &str,
) -> Result<Option<&'a DatabaseValue>> {
    match row.get(column) {
        None => Err(DatabaseError::ColumnNotFound(column.to_string())),
        Some(DatabaseValue::Null) => Ok(None),
        Some(value) => Ok(Some(value)),
    }
}

pub(crate) fn mismatch(column_type: &dyn ColumnType, value: &DatabaseValue) -> DatabaseError {
    DatabaseError::type_mismatch(
        &format!("{} ({})", column_type.name(), column_type.native_kind()),
        value.type_name(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn row_of(column: &str, value: DatabaseValue) -> DatabaseRow {
        let mut row = DatabaseRow::new();
        row.insert(column.to_string(), value);
        row
    }

    #[test]
    fn test_same_codec_ignores_properties() {
        let a = SmallInt::new(3);
        let b = SmallInt::new(6);
        let c = USmallInt::new(6);
        assert!(same_codec(&a, &b));
        assert!(!same_codec(&a, &c));

        let shared: Arc<dyn ColumnType> = Arc::new(SmallInt::new(1));
        assert!(same_codec(shared.as_ref(), &a));
    }

    #[test]
    fn test_builtins_are_distinct() {
        let all = builtins();
        for (i, a) in all.iter().enumerate() {
            for b in all.iter().skip(i + 1) {
                assert!(!same_codec(a.as_ref(), b.as_ref()), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_read_column() {
        let row = row_of("a", DatabaseValue::Null);
        assert!(matches!(read_column(&row, "a"), Ok(None)));
        assert!(matches!(
            read_column(&row, "b"),
            Err(DatabaseError::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_sql_codes() {
        assert_eq!(SqlCode::SmallInt.code(), 5);
        assert_eq!(SqlCode::BigInt.code(), -5);
        assert_eq!(SqlCode::Timestamp.code(), 93);
    }
}
