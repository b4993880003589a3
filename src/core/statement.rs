//! Prepared statements and parameter binding
//!
//! A [`PreparedStatement`] is the client-side handle a [`Database`] hands out for
//! a piece of SQL. Column type codecs write into its positional slots, and the
//! backend reads the slots back when the statement is executed.
//! [`StatementAssembler`] glues a built predicate and its bindings onto one.

use super::column_type::ColumnType;
use super::database::Database;
use super::error::{DatabaseError, Result};
use super::registry::TypeRegistry;
use super::value::DatabaseValue;
use super::where_builder::RawWhere;
use std::sync::Arc;
use tracing::debug;

/// A value paired with the column type that will encode it
#[derive(Debug, Clone)]
pub struct Binding {
    /// The value to bind
    pub value: DatabaseValue,
    /// The codec that writes `value` into the statement
    pub column_type: Arc<dyn ColumnType>,
}

impl Binding {
    /// Pair a value with an explicit column type
    pub fn new(value: impl Into<DatabaseValue>, column_type: Arc<dyn ColumnType>) -> Self {
        Self {
            value: value.into(),
            column_type,
        }
    }

    /// Pair a value with the highest-priority column type registered for its kind
    ///
    /// # Errors
    ///
    /// Returns `NoTypeMapping` when no column type handles the value's kind
    pub fn infer(value: impl Into<DatabaseValue>, registry: &TypeRegistry) -> Result<Self> {
        let value = value.into();
        let column_type = registry.first(&value)?;
        Ok(Self { value, column_type })
    }
}

/// Client-side prepared statement with 1-based positional parameters
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedStatement {
    sql: String,
    slots: Vec<Option<DatabaseValue>>,
}

impl PreparedStatement {
    /// Prepare `sql`, counting its `?` placeholders outside quoted text
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let count = placeholder_positions(&sql).len();
        Self {
            sql,
            slots: vec![None; count],
        }
    }

    /// The statement text
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of placeholders in the statement
    pub fn parameter_count(&self) -> usize {
        self.slots.len()
    }

    /// Bind `value` to the parameter at `index` (1-based)
    ///
    /// # Errors
    ///
    /// Returns `ParameterIndex` when `index` is outside `1..=parameter_count()`
    pub fn set(&mut self, index: usize, value: DatabaseValue) -> Result<()> {
        let count = self.slots.len();
        let slot = index
            .checked_sub(1)
            .and_then(|i| self.slots.get_mut(i))
            .ok_or(DatabaseError::ParameterIndex { index, count })?;
        *slot = Some(value);
        Ok(())
    }

    /// Bind SQL NULL to the parameter at `index` (1-based)
    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.set(index, DatabaseValue::Null)
    }

    /// Forget every bound value
    pub fn clear_parameters(&mut self) {
        self.slots.iter_mut().for_each(|slot| *slot = None);
    }

    /// Check if every placeholder has a value
    pub fn is_fully_bound(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The bound values in placeholder order
    ///
    /// # Errors
    ///
    /// Returns `UnboundParameter` for the first placeholder without a value
    pub fn parameters(&self) -> Result<Vec<DatabaseValue>> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                slot.clone()
                    .ok_or(DatabaseError::UnboundParameter { index: i + 1 })
            })
            .collect()
    }
}

/// Turns predicate fragments and their bindings into executable statements
pub struct StatementAssembler;

impl StatementAssembler {
    /// Prepare `statement_text` followed by the predicate fragment and bind its values
    ///
    /// # Errors
    ///
    /// Propagates the connection's prepare error or the first codec error
    /// (`TypeMismatch`, `RangeError`) unchanged; the partially bound
    /// statement is dropped.
    pub fn assemble<D: Database + ?Sized>(
        db: &D,
        statement_text: &str,
        raw: &RawWhere,
    ) -> Result<PreparedStatement> {
        let sql = format!("{}{}", statement_text, raw.sql);
        Self::assemble_bindings(db, &sql, &raw.bindings)
    }

    /// Prepare `sql` and encode `bindings` into parameters `1..=bindings.len()`
    pub fn assemble_bindings<D: Database + ?Sized>(
        db: &D,
        sql: &str,
        bindings: &[Binding],
    ) -> Result<PreparedStatement> {
        let mut statement = db.prepare_statement(sql)?;
        for (position, binding) in bindings.iter().enumerate() {
            binding
                .column_type
                .encode(&mut statement, position + 1, &binding.value)?;
        }
        debug!(
            sql = statement.sql(),
            bindings = bindings.len(),
            "assembled prepared statement"
        );
        Ok(statement)
    }
}

/// Byte offsets of `?` placeholders outside quoted strings and identifiers
pub(crate) fn placeholder_positions(sql: &str) -> Vec<usize> {
    let mut positions = Vec::new();
    let mut quote: Option<char> = None;
    for (offset, ch) in sql.char_indices() {
        match quote {
            Some(q) if ch == q => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' | '`' => quote = Some(ch),
                '?' => positions.push(offset),
                _ => {}
            },
        }
    }
    positions
}

/// Rewrite `?` placeholders to `$1, $2, ...` for drivers that number them
pub(crate) fn number_placeholders(sql: &str) -> String {
    let positions = placeholder_positions(sql);
    if positions.is_empty() {
        return sql.to_string();
    }

    let mut out = String::with_capacity(sql.len() + positions.len() * 2);
    let mut last = 0;
    for (n, offset) in positions.iter().enumerate() {
        out.push_str(&sql[last..*offset]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        last = offset + 1;
    }
    out.push_str(&sql[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_count_skips_quotes() {
        let stmt = PreparedStatement::new("SELECT * FROM t WHERE a = ? AND b = 'what?' AND c IN (?, ?)");
        assert_eq!(stmt.parameter_count(), 3);

        let stmt = PreparedStatement::new("SELECT \"odd?col\", `x?` FROM t");
        assert_eq!(stmt.parameter_count(), 0);

        let stmt = PreparedStatement::new("SELECT 'it''s?' , ?");
        assert_eq!(stmt.parameter_count(), 1);
    }

    #[test]
    fn test_set_checks_index() {
        let mut stmt = PreparedStatement::new("SELECT ?, ?");
        assert!(stmt.set(1, DatabaseValue::Int(1)).is_ok());
        assert!(matches!(
            stmt.set(0, DatabaseValue::Int(1)),
            Err(DatabaseError::ParameterIndex { index: 0, count: 2 })
        ));
        assert!(matches!(
            stmt.set(3, DatabaseValue::Int(1)),
            Err(DatabaseError::ParameterIndex { index: 3, count: 2 })
        ));
    }

    #[test]
    fn test_parameters_require_every_slot() {
        let mut stmt = PreparedStatement::new("SELECT ?, ?");
        stmt.set(2, DatabaseValue::from("b")).unwrap();
        assert!(!stmt.is_fully_bound());
        assert!(matches!(
            stmt.parameters(),
            Err(DatabaseError::UnboundParameter { index: 1 })
        ));

        stmt.set_null(1).unwrap();
        assert_eq!(
            stmt.parameters().unwrap(),
            vec![DatabaseValue::Null, DatabaseValue::from("b")]
        );

        stmt.clear_parameters();
        assert!(!stmt.is_fully_bound());
    }

    #[test]
    fn test_number_placeholders() {
        assert_eq!(
            number_placeholders("SELECT * FROM t WHERE a = ? AND b = '?' AND c BETWEEN ? AND ?"),
            "SELECT * FROM t WHERE a = $1 AND b = '?' AND c BETWEEN $2 AND $3"
        );
        assert_eq!(number_placeholders("SELECT 1"), "SELECT 1");
    }

    #[cfg(feature = "sqlite")]
    mod assembler {
        use super::super::*;
        use crate::backends::SqliteDatabase;
        use crate::core::column_type::{SmallInt, Text, UBigInt};
        use crate::core::registry::TypeRegistry;
        use crate::core::where_builder::{Where, WhereClause};

        #[tokio::test]
        async fn test_assemble_binds_in_order() -> Result<()> {
            let db = SqliteDatabase::new();
            db.connect(":memory:").await?;
            let registry = Arc::new(TypeRegistry::with_builtins());

            let raw = Where::new(Arc::clone(&registry))
                .key("age")
                .greater_or_equals(18i16)?
                .and("status")
                .equal("active")?
                .build_as_raw();

            let stmt = StatementAssembler::assemble(&db, "SELECT * FROM users", &raw)?;
            assert_eq!(
                stmt.sql(),
                "SELECT * FROM users WHERE age >= ? and status <=> ?"
            );
            assert_eq!(
                stmt.parameters()?,
                vec![DatabaseValue::Short(18), DatabaseValue::from("active")]
            );
            Ok(())
        }

        #[tokio::test]
        async fn test_assemble_propagates_codec_errors() -> Result<()> {
            let db = SqliteDatabase::new();
            db.connect(":memory:").await?;

            let bindings = vec![
                Binding::new(1i16, Arc::new(SmallInt::new(5))),
                Binding::new("oops", Arc::new(SmallInt::new(5))),
            ];
            let err = StatementAssembler::assemble_bindings(&db, "SELECT ?, ?", &bindings)
                .unwrap_err();
            assert!(matches!(err, DatabaseError::TypeMismatch { .. }));

            let too_big: rust_decimal::Decimal = "18446744073709551616".parse().unwrap();
            let bindings = vec![Binding::new(too_big, Arc::new(UBigInt::new(20)))];
            let err =
                StatementAssembler::assemble_bindings(&db, "SELECT ?", &bindings).unwrap_err();
            assert!(matches!(err, DatabaseError::RangeError { .. }));
            Ok(())
        }

        #[test]
        fn test_assemble_requires_connection() {
            let db = SqliteDatabase::new();
            let bindings = vec![Binding::new("x", Arc::new(Text::new(255)))];
            let err =
                StatementAssembler::assemble_bindings(&db, "SELECT ?", &bindings).unwrap_err();
            assert!(matches!(err, DatabaseError::ConnectionError(_)));
        }
    }
}
