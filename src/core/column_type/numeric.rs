//! Integer, unsigned and floating point column types
//!
//! Signed integer types narrow any numeric value to their host width with
//! wrapping conversion; keeping values in range is the caller's job. `UBIGINT`
//! is the exception and rejects anything outside `0..=2^64-1`.

use super::{mismatch, read_column, ColumnFlags, ColumnType, SqlCode};
use crate::core::error::{DatabaseError, Result};
use crate::core::statement::PreparedStatement;
use crate::core::value::{DatabaseRow, DatabaseValue, ValueKind};
use rust_decimal::Decimal;

const INTEGER_FLAGS: ColumnFlags = ColumnFlags {
    allow_primary_key: true,
    allow_not_null: true,
    allow_unique: true,
    is_unsigned: false,
    allow_zero_fill: true,
    allow_auto_increment: true,
    allow_default: true,
};

const UNSIGNED_INTEGER_FLAGS: ColumnFlags = ColumnFlags {
    is_unsigned: true,
    ..INTEGER_FLAGS
};

/// Integral part of a numeric value, `None` for non-numeric kinds
fn numeric_as_long(value: &DatabaseValue) -> Option<i64> {
    if value.kind().is_numeric() {
        value.as_long()
    } else {
        None
    }
}

fn encode_integer(
    column_type: &dyn ColumnType,
    statement: &mut PreparedStatement,
    index: usize,
    value: &DatabaseValue,
    narrow: impl Fn(i64) -> DatabaseValue,
) -> Result<()> {
    if value.is_null() {
        return statement.set_null(index);
    }
    let n = numeric_as_long(value).ok_or_else(|| mismatch(column_type, value))?;
    statement.set(index, narrow(n))
}

fn decode_integer(
    column_type: &dyn ColumnType,
    row: &DatabaseRow,
    column: &str,
    widen: impl Fn(i64) -> Option<DatabaseValue>,
) -> Result<Option<DatabaseValue>> {
    let Some(value) = read_column(row, column)? else {
        return Ok(None);
    };
    value
        .as_long()
        .and_then(widen)
        .map(Some)
        .ok_or_else(|| mismatch(column_type, value))
}

/// `SMALLINT`: -32768 to 32767, stored as `i16`
#[derive(Debug, Clone)]
pub struct SmallInt {
    width: u8,
}

impl SmallInt {
    /// `width` is the display width in digits, not the maximum value
    pub fn new(width: u8) -> Self {
        Self { width }
    }
}

impl ColumnType for SmallInt {
    fn name(&self) -> &'static str {
        "SMALLINT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Short
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::SmallInt
    }

    fn flags(&self) -> ColumnFlags {
        INTEGER_FLAGS
    }

    fn declaration(&self) -> String {
        format!("SMALLINT({})", self.width)
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind().is_numeric()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        encode_integer(self, statement, index, value, |n| {
            DatabaseValue::Short(n as i16)
        })
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        decode_integer(self, row, column, |n| {
            i16::try_from(n).ok().map(DatabaseValue::Short)
        })
    }
}

/// Unsigned `SMALLINT`: 0 to 65535, widened to an `i32` host value
#[derive(Debug, Clone)]
pub struct USmallInt {
    width: u8,
}

impl USmallInt {
    pub fn new(width: u8) -> Self {
        Self { width }
    }
}

impl ColumnType for USmallInt {
    fn name(&self) -> &'static str {
        "SMALLINT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Int
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::SmallInt
    }

    fn flags(&self) -> ColumnFlags {
        UNSIGNED_INTEGER_FLAGS
    }

    fn declaration(&self) -> String {
        format!("SMALLINT({})", self.width)
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind().is_numeric()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        encode_integer(self, statement, index, value, |n| {
            DatabaseValue::Int(n as i32)
        })
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        decode_integer(self, row, column, |n| {
            i32::try_from(n).ok().map(DatabaseValue::Int)
        })
    }
}

/// `INT`: 32-bit signed integer
#[derive(Debug, Clone)]
pub struct Integer {
    width: u8,
}

impl Integer {
    pub fn new(width: u8) -> Self {
        Self { width }
    }
}

impl ColumnType for Integer {
    fn name(&self) -> &'static str {
        "INT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Int
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Integer
    }

    fn flags(&self) -> ColumnFlags {
        INTEGER_FLAGS
    }

    fn declaration(&self) -> String {
        format!("INT({})", self.width)
    }

    // USMALLINT claims i32 values first
    fn priority(&self) -> i32 {
        12
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind().is_numeric()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        encode_integer(self, statement, index, value, |n| {
            DatabaseValue::Int(n as i32)
        })
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        decode_integer(self, row, column, |n| {
            i32::try_from(n).ok().map(DatabaseValue::Int)
        })
    }
}

/// `BIGINT`: 64-bit signed integer
#[derive(Debug, Clone)]
pub struct BigInt {
    width: u8,
}

impl BigInt {
    pub fn new(width: u8) -> Self {
        Self { width }
    }
}

impl ColumnType for BigInt {
    fn name(&self) -> &'static str {
        "BIGINT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Long
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::BigInt
    }

    fn flags(&self) -> ColumnFlags {
        INTEGER_FLAGS
    }

    fn declaration(&self) -> String {
        format!("BIGINT({})", self.width)
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind().is_numeric()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        encode_integer(self, statement, index, value, DatabaseValue::Long)
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        decode_integer(self, row, column, |n| Some(DatabaseValue::Long(n)))
    }
}

/// Unsigned `BIGINT`: 0 to 18446744073709551615, carried as a decimal
#[derive(Debug, Clone)]
pub struct UBigInt {
    width: u8,
}

impl UBigInt {
    pub fn new(width: u8) -> Self {
        Self { width }
    }

    /// Largest storable value, 2^64 - 1
    pub fn max_value() -> Decimal {
        Decimal::from(u64::MAX)
    }
}

impl ColumnType for UBigInt {
    fn name(&self) -> &'static str {
        "BIGINT"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Decimal
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::BigInt
    }

    fn flags(&self) -> ColumnFlags {
        UNSIGNED_INTEGER_FLAGS
    }

    fn declaration(&self) -> String {
        format!("BIGINT({})", self.width)
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        matches!(
            value,
            DatabaseValue::Null
                | DatabaseValue::Decimal(_)
                | DatabaseValue::Short(_)
                | DatabaseValue::Int(_)
                | DatabaseValue::Long(_)
        )
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        if value.is_null() {
            return statement.set_null(index);
        }
        if !self.accepts(value) {
            return Err(mismatch(self, value));
        }
        let n = value.as_decimal().ok_or_else(|| mismatch(self, value))?;
        if !n.fract().is_zero() {
            return Err(DatabaseError::type_mismatch("integral decimal", &n.to_string()));
        }
        if n < Decimal::ZERO || n > Self::max_value() {
            return Err(DatabaseError::range(
                "UBIGINT",
                n,
                0,
                Self::max_value(),
            ));
        }
        statement.set(index, DatabaseValue::Decimal(n.normalize()))
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        let Some(value) = read_column(row, column)? else {
            return Ok(None);
        };
        value
            .as_decimal()
            .map(|n| Some(DatabaseValue::Decimal(n.normalize())))
            .ok_or_else(|| mismatch(self, value))
    }
}

/// `DOUBLE`: 64-bit floating point
#[derive(Debug, Clone, Default)]
pub struct Double;

impl Double {
    pub fn new() -> Self {
        Self
    }
}

impl ColumnType for Double {
    fn name(&self) -> &'static str {
        "DOUBLE"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Double
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Double
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_auto_increment: false,
            ..INTEGER_FLAGS
        }
    }

    fn accepts(&self, value: &DatabaseValue) -> bool {
        value.is_null() || value.kind().is_numeric()
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        if value.is_null() {
            return statement.set_null(index);
        }
        if !value.kind().is_numeric() {
            return Err(mismatch(self, value));
        }
        let n = value.as_double().ok_or_else(|| mismatch(self, value))?;
        statement.set(index, DatabaseValue::Double(n))
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        let Some(value) = read_column(row, column)? else {
            return Ok(None);
        };
        value
            .as_double()
            .map(|n| Some(DatabaseValue::Double(n)))
            .ok_or_else(|| mismatch(self, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::tests::row_of;
    use std::str::FromStr;

    fn encode_one(column_type: &dyn ColumnType, value: DatabaseValue) -> Result<DatabaseValue> {
        let mut stmt = PreparedStatement::new("SELECT ?");
        column_type.encode(&mut stmt, 1, &value)?;
        Ok(stmt.parameters()?.remove(0))
    }

    #[test]
    fn test_smallint_narrows_numbers() {
        let codec = SmallInt::new(6);
        assert_eq!(
            encode_one(&codec, DatabaseValue::Int(-32768)).unwrap(),
            DatabaseValue::Short(-32768)
        );
        assert_eq!(
            encode_one(&codec, DatabaseValue::Double(12.9)).unwrap(),
            DatabaseValue::Short(12)
        );
        // Out of range values wrap; the caller owns the range
        assert_eq!(
            encode_one(&codec, DatabaseValue::Int(32768)).unwrap(),
            DatabaseValue::Short(-32768)
        );
    }

    #[test]
    fn test_smallint_rejects_strings() {
        let err = encode_one(&SmallInt::new(6), DatabaseValue::from("12")).unwrap_err();
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));
    }

    #[test]
    fn test_smallint_decode() {
        let codec = SmallInt::new(6);
        let row = row_of("n", DatabaseValue::Long(32767));
        assert_eq!(
            codec.decode(&row, "n").unwrap(),
            Some(DatabaseValue::Short(32767))
        );
        let row = row_of("n", DatabaseValue::Null);
        assert_eq!(codec.decode(&row, "n").unwrap(), None);
    }

    #[test]
    fn test_usmallint_widens() {
        let codec = USmallInt::new(5);
        assert!(codec.flags().is_unsigned);
        assert_eq!(
            encode_one(&codec, DatabaseValue::Short(7)).unwrap(),
            DatabaseValue::Int(7)
        );
        let row = row_of("n", DatabaseValue::Long(65535));
        assert_eq!(
            codec.decode(&row, "n").unwrap(),
            Some(DatabaseValue::Int(65535))
        );
    }

    #[test]
    fn test_ubigint_range() {
        let codec = UBigInt::new(20);
        let max = DatabaseValue::from(u64::MAX);
        assert_eq!(encode_one(&codec, max.clone()).unwrap(), max);
        assert_eq!(
            encode_one(&codec, DatabaseValue::Long(0)).unwrap(),
            DatabaseValue::Decimal(Decimal::ZERO)
        );

        let over = DatabaseValue::Decimal(Decimal::from_str("18446744073709551616").unwrap());
        assert!(matches!(
            encode_one(&codec, over).unwrap_err(),
            DatabaseError::RangeError { .. }
        ));
        assert!(matches!(
            encode_one(&codec, DatabaseValue::Long(-1)).unwrap_err(),
            DatabaseError::RangeError { .. }
        ));
        assert!(matches!(
            encode_one(&codec, DatabaseValue::Double(1.0)).unwrap_err(),
            DatabaseError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn test_ubigint_decode_from_text() {
        let codec = UBigInt::new(20);
        let row = row_of(
            "n",
            DatabaseValue::String("18446744073709551615".to_string()),
        );
        assert_eq!(
            codec.decode(&row, "n").unwrap(),
            Some(DatabaseValue::from(u64::MAX))
        );
    }

    #[test]
    fn test_integer_priority_behind_usmallint() {
        assert!(USmallInt::new(5).priority() < Integer::new(11).priority());
    }

    #[test]
    fn test_double_round_trip_values() {
        let codec = Double::new();
        assert_eq!(
            encode_one(&codec, DatabaseValue::Int(3)).unwrap(),
            DatabaseValue::Double(3.0)
        );
        let row = row_of("d", DatabaseValue::Double(2.5));
        assert_eq!(
            codec.decode(&row, "d").unwrap(),
            Some(DatabaseValue::Double(2.5))
        );
    }
}
