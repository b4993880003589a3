//! Typed WHERE clause builder
//!
//! A predicate is built by a chain of calls that moves through three states:
//!
//! - [`Where`]: nothing filtered yet. Pick a column with `key`, or set ordering
//!   and limits.
//! - [`KeyedWhere`]: a column is pending. Exactly one operator closes it.
//! - [`FilteredWhere`]: a predicate is complete. Chain another with `and`/`or`,
//!   or finish with [`WhereClause::build_as_raw`].
//!
//! Each call consumes the current state, so an operator cannot be applied twice to
//! the same key and a pending key can never be finalized.
//!
//! ```
//! use std::sync::Arc;
//! use rust_typed_sql::core::registry::TypeRegistry;
//! use rust_typed_sql::core::where_builder::{Where, WhereClause};
//!
//! let registry = Arc::new(TypeRegistry::with_builtins());
//! let raw = Where::new(registry)
//!     .key("age")
//!     .greater_or_equals(18i16)?
//!     .and("status")
//!     .equal("active")?
//!     .build_as_raw();
//!
//! assert_eq!(raw.sql, " WHERE age >= ? and status <=> ?");
//! assert_eq!(raw.bindings.len(), 2);
//! # Ok::<(), rust_typed_sql::DatabaseError>(())
//! ```
//!
//! `and`/`or` are spliced in as written, without parentheses, so a chain like
//! `a = ? or b = ? and c = ?` follows SQL precedence (`and` binds tighter). Use
//! [`FilteredWhere::add`] to group explicitly.

use super::database_types::DatabaseType;
use super::error::Result;
use super::registry::TypeRegistry;
use super::statement::Binding;
use super::value::DatabaseValue;
use std::fmt::Write as _;
use std::sync::Arc;

/// ORDER BY direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Ascending order
    Asc,
    /// Descending order
    Desc,
}

impl OrderDirection {
    pub(crate) fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// A finished predicate fragment and the values for its placeholders
#[derive(Debug, Clone, Default)]
pub struct RawWhere {
    /// SQL fragment, empty or starting with a space
    pub sql: String,
    /// One binding per `?` in `sql`, in placeholder order
    pub bindings: Vec<Binding>,
}

impl RawWhere {
    /// Check if there is nothing to append
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// The bound values in placeholder order
    pub fn values(&self) -> Vec<&DatabaseValue> {
        self.bindings.iter().map(|b| &b.value).collect()
    }
}

/// A builder state that can be finalized
pub trait WhereClause {
    /// Finish the predicate, appending ordering and limit
    fn build_as_raw(self) -> RawWhere;
}

/// Accumulated predicate text and bindings shared by every builder state
#[derive(Debug)]
struct PredicateState {
    registry: Arc<TypeRegistry>,
    dialect: DatabaseType,
    text: String,
    bindings: Vec<Binding>,
    order: Vec<(String, OrderDirection)>,
    limit: Option<u64>,
}

impl PredicateState {
    fn push(&mut self, sql: &str) {
        self.text.push_str(sql);
    }

    fn bind(&mut self, value: DatabaseValue) -> Result<()> {
        let binding = Binding::infer(value, &self.registry)?;
        self.bindings.push(binding);
        Ok(())
    }

    fn finish(self) -> RawWhere {
        let mut sql = String::new();
        let predicate = self.text.trim_start();
        if !predicate.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if !self.order.is_empty() {
            let clauses: Vec<String> = self
                .order
                .iter()
                .map(|(column, direction)| format!("{} {}", column, direction.as_sql()))
                .collect();
            let _ = write!(sql, " ORDER BY {}", clauses.join(", "));
        }
        if let Some(limit) = self.limit {
            let _ = write!(sql, " LIMIT {}", limit);
        }
        RawWhere {
            sql,
            bindings: self.bindings,
        }
    }
}

/// Initial builder state
#[derive(Debug)]
#[must_use]
pub struct Where {
    state: PredicateState,
}

impl Where {
    /// Start an empty predicate using MySQL operator syntax
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_dialect(registry, DatabaseType::Mysql)
    }

    /// Start an empty predicate rendering operators for `dialect`
    pub fn with_dialect(registry: Arc<TypeRegistry>, dialect: DatabaseType) -> Self {
        Self {
            state: PredicateState {
                registry,
                dialect,
                text: String::new(),
                bindings: Vec::new(),
                order: Vec::new(),
                limit: None,
            },
        }
    }

    /// Select the column the next operator applies to
    pub fn key(mut self, column: &str) -> KeyedWhere {
        self.state.push(" ");
        self.state.push(column);
        KeyedWhere { state: self.state }
    }

    /// Append an ORDER BY term
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.state.order.push((column.to_string(), direction));
        self
    }

    /// Cap the number of rows; a later call replaces the earlier one
    pub fn limit(mut self, rows: u64) -> Self {
        self.state.limit = Some(rows);
        self
    }

    /// Append raw SQL verbatim
    ///
    /// Placeholders inside `sql` are not bound.
    pub fn add(mut self, sql: &str) -> FilteredWhere {
        self.state.push(sql);
        FilteredWhere { state: self.state }
    }
}

impl WhereClause for Where {
    fn build_as_raw(self) -> RawWhere {
        self.state.finish()
    }
}

/// A column is selected and waits for its operator
#[derive(Debug)]
#[must_use]
pub struct KeyedWhere {
    state: PredicateState,
}

impl KeyedWhere {
    fn close(mut self, sql: &str) -> FilteredWhere {
        self.state.push(sql);
        FilteredWhere { state: self.state }
    }

    fn compare(mut self, operator: &str, value: DatabaseValue) -> Result<FilteredWhere> {
        self.state.bind(value)?;
        self.state.push(" ");
        self.state.push(operator);
        self.state.push(" ?");
        Ok(FilteredWhere { state: self.state })
    }

    fn range(mut self, negated: bool, from: DatabaseValue, to: DatabaseValue) -> Result<FilteredWhere> {
        self.state.bind(from)?;
        self.state.bind(to)?;
        if negated {
            self.state.push(" NOT");
        }
        self.state.push(" BETWEEN ? AND ?");
        Ok(FilteredWhere { state: self.state })
    }

    fn membership(mut self, negated: bool, values: Vec<DatabaseValue>) -> Result<FilteredWhere> {
        let count = values.len();
        for value in values {
            self.state.bind(value)?;
        }
        if negated {
            self.state.push(" NOT");
        }
        if count == 0 {
            // `IN ()` is a syntax error; nothing is ever equal to NULL
            self.state.push(" IN (NULL)");
        } else {
            self.state.push(" IN (");
            self.state.push(&vec!["?"; count].join(", "));
            self.state.push(")");
        }
        Ok(FilteredWhere { state: self.state })
    }

    /// Null-safe equality (`<=>` on MySQL)
    pub fn equal(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        let operator = self.state.dialect.null_safe_equal();
        self.compare(operator, value.into())
    }

    /// `<>`
    pub fn not_equals(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare("<>", value.into())
    }

    pub fn greater(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare(">", value.into())
    }

    pub fn less(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare("<", value.into())
    }

    pub fn greater_or_equals(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare(">=", value.into())
    }

    pub fn less_or_equals(self, value: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare("<=", value.into())
    }

    pub fn is_null(self) -> FilteredWhere {
        self.close(" IS NULL")
    }

    pub fn is_not_null(self) -> FilteredWhere {
        self.close(" IS NOT NULL")
    }

    pub fn is_true(self) -> FilteredWhere {
        self.close(" IS TRUE")
    }

    pub fn is_false(self) -> FilteredWhere {
        self.close(" IS FALSE")
    }

    pub fn is_unknown(self) -> FilteredWhere {
        let sql = format!(" {}", self.state.dialect.is_unknown());
        self.close(&sql)
    }

    /// `BETWEEN ? AND ?`, binding `from` then `to`
    pub fn between(
        self,
        from: impl Into<DatabaseValue>,
        to: impl Into<DatabaseValue>,
    ) -> Result<FilteredWhere> {
        self.range(false, from.into(), to.into())
    }

    /// `NOT BETWEEN ? AND ?`, binding `from` then `to`
    pub fn not_between(
        self,
        from: impl Into<DatabaseValue>,
        to: impl Into<DatabaseValue>,
    ) -> Result<FilteredWhere> {
        self.range(true, from.into(), to.into())
    }

    /// `IN (?, ...)` with one placeholder per value
    ///
    /// An empty set renders `IN (NULL)`, which matches no rows.
    pub fn is_in<I, V>(self, values: I) -> Result<FilteredWhere>
    where
        I: IntoIterator<Item = V>,
        V: Into<DatabaseValue>,
    {
        self.membership(false, values.into_iter().map(Into::into).collect())
    }

    /// `NOT IN (?, ...)` with one placeholder per value
    pub fn is_not_in<I, V>(self, values: I) -> Result<FilteredWhere>
    where
        I: IntoIterator<Item = V>,
        V: Into<DatabaseValue>,
    {
        self.membership(true, values.into_iter().map(Into::into).collect())
    }

    pub fn like(self, pattern: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare("LIKE", pattern.into())
    }

    pub fn not_like(self, pattern: impl Into<DatabaseValue>) -> Result<FilteredWhere> {
        self.compare("NOT LIKE", pattern.into())
    }
}

/// At least one predicate is complete
#[derive(Debug)]
#[must_use]
pub struct FilteredWhere {
    state: PredicateState,
}

impl FilteredWhere {
    /// Chain `and <column>`
    pub fn and(mut self, column: &str) -> KeyedWhere {
        self.state.push(" and ");
        self.state.push(column);
        KeyedWhere { state: self.state }
    }

    /// Chain `or <column>`
    pub fn or(mut self, column: &str) -> KeyedWhere {
        self.state.push(" or ");
        self.state.push(column);
        KeyedWhere { state: self.state }
    }

    /// Append an ORDER BY term
    pub fn order_by(mut self, column: &str, direction: OrderDirection) -> Self {
        self.state.order.push((column.to_string(), direction));
        self
    }

    /// Cap the number of rows; a later call replaces the earlier one
    pub fn limit(mut self, rows: u64) -> Self {
        self.state.limit = Some(rows);
        self
    }

    /// Append raw SQL verbatim
    ///
    /// Placeholders inside `sql` are not bound, so a `?` here shifts every
    /// later binding by one position.
    pub fn add(mut self, sql: &str) -> Self {
        self.state.push(sql);
        self
    }
}

impl WhereClause for FilteredWhere {
    fn build_as_raw(self) -> RawWhere {
        self.state.finish()
    }
}
