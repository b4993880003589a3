//! Statement builders
//!
//! SELECT and DELETE take their predicate from a [`WhereClause`]; INSERT and UPSERT
//! collect one typed binding per column. Every builder renders `?` placeholders
//! and hands its bindings to the [`StatementAssembler`], so values never end up
//! in the SQL text.

use super::column_type::ColumnType;
use super::database::Database;
use super::database_types::DatabaseType;
use super::error::{DatabaseError, Result};
use super::registry::TypeRegistry;
use super::schema::Table;
use super::statement::{Binding, PreparedStatement, StatementAssembler};
use super::value::{DatabaseResult, DatabaseValue};
use super::where_builder::{RawWhere, WhereClause};
use std::sync::Arc;

/// Complete statement text and its bindings
#[derive(Debug, Clone, Default)]
pub struct RawStatement {
    pub sql: String,
    pub bindings: Vec<Binding>,
}

impl RawStatement {
    /// Prepare on `db` and encode every binding
    pub fn prepare<D: Database + ?Sized>(&self, db: &D) -> Result<PreparedStatement> {
        StatementAssembler::assemble_bindings(db, &self.sql, &self.bindings)
    }
}

/// SELECT query builder
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    filter: RawWhere,
}

impl SelectBuilder {
    /// Create a new SELECT query builder
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use rust_typed_sql::core::query_builder::SelectBuilder;
    /// use rust_typed_sql::core::registry::TypeRegistry;
    /// use rust_typed_sql::core::where_builder::Where;
    ///
    /// let registry = Arc::new(TypeRegistry::with_builtins());
    /// let query = SelectBuilder::new("users")
    ///     .columns(&["id", "name"])
    ///     .filter(Where::new(registry).key("id").equal(7i64)?)
    ///     .build_as_raw();
    ///
    /// assert_eq!(query.sql, "SELECT id, name FROM users WHERE id <=> ?");
    /// # Ok::<(), rust_typed_sql::DatabaseError>(())
    /// ```
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec!["*".to_string()],
            filter: RawWhere::default(),
        }
    }

    /// Create a SELECT over a declared table
    pub fn for_table(table: &Table) -> Self {
        Self::new(table.name())
    }

    /// Select specific columns
    #[must_use]
    pub fn columns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Select all columns (*)
    #[must_use]
    pub fn all_columns(mut self) -> Self {
        self.columns = vec!["*".to_string()];
        self
    }

    /// Use `clause` as the WHERE/ORDER BY/LIMIT tail, replacing any earlier one
    #[must_use]
    pub fn filter(mut self, clause: impl WhereClause) -> Self {
        self.filter = clause.build_as_raw();
        self
    }

    /// Render the statement text and collect its bindings
    pub fn build_as_raw(&self) -> RawStatement {
        RawStatement {
            sql: format!(
                "SELECT {} FROM {}{}",
                self.columns.join(", "),
                self.table,
                self.filter.sql
            ),
            bindings: self.filter.bindings.clone(),
        }
    }

    /// Prepare the statement on `db` with every value bound
    pub fn build<D: Database + ?Sized>(&self, db: &D) -> Result<PreparedStatement> {
        self.build_as_raw().prepare(db)
    }

    /// Run the query, re-opening a dropped connection first
    pub async fn send<D: Database + ?Sized>(&self, db: &D) -> Result<DatabaseResult> {
        db.reconnect(false).await?;
        let statement = self.build(db)?;
        db.execute_query(&statement).await
    }
}

/// DELETE statement builder
#[derive(Debug, Clone)]
pub struct DeleteBuilder {
    table: String,
    filter: RawWhere,
}

impl DeleteBuilder {
    /// Create a new DELETE builder; without a filter it deletes every row
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: RawWhere::default(),
        }
    }

    /// Restrict the deleted rows
    #[must_use]
    pub fn filter(mut self, clause: impl WhereClause) -> Self {
        self.filter = clause.build_as_raw();
        self
    }

    pub fn build_as_raw(&self) -> RawStatement {
        RawStatement {
            sql: format!("DELETE FROM {}{}", self.table, self.filter.sql),
            bindings: self.filter.bindings.clone(),
        }
    }

    pub fn build<D: Database + ?Sized>(&self, db: &D) -> Result<PreparedStatement> {
        self.build_as_raw().prepare(db)
    }

    /// Run the statement and return the number of deleted rows
    pub async fn send<D: Database + ?Sized>(&self, db: &D) -> Result<u64> {
        db.reconnect(false).await?;
        let statement = self.build(db)?;
        db.execute_update(&statement).await
    }
}

/// INSERT statement builder
///
/// Columns keep the order of their first `add`; adding a column again replaces
/// its value in place.
#[derive(Debug, Clone)]
pub struct InsertBuilder {
    table: String,
    registry: Arc<TypeRegistry>,
    declared: Option<Table>,
    values: Vec<(String, Binding)>,
}

impl InsertBuilder {
    /// Create an INSERT whose column types are inferred from the values
    pub fn new(table: impl Into<String>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            table: table.into(),
            registry,
            declared: None,
            values: Vec::new(),
        }
    }

    /// Create an INSERT that encodes declared columns with their declared type
    pub fn for_table(table: &Table, registry: Arc<TypeRegistry>) -> Self {
        Self {
            table: table.name().to_string(),
            registry,
            declared: Some(table.clone()),
            values: Vec::new(),
        }
    }

    /// Set `key` to `value`, encoded by `column_type`
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` when `column_type` cannot encode the value
    pub fn add_typed(
        mut self,
        column_type: Arc<dyn ColumnType>,
        key: &str,
        value: impl Into<DatabaseValue>,
    ) -> Result<Self> {
        let value = value.into();
        if !column_type.accepts(&value) {
            return Err(DatabaseError::type_mismatch(
                column_type.name(),
                value.type_name(),
            ));
        }
        let binding = Binding::new(value, column_type);
        match self.values.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = binding,
            None => self.values.push((key.to_string(), binding)),
        }
        Ok(self)
    }

    /// Set `key` to `value`, encoded by the declared column type or the
    /// registry's best match for the value
    ///
    /// # Errors
    ///
    /// Returns `NoTypeMapping` when no column type fits the value
    pub fn add(self, key: &str, value: impl Into<DatabaseValue>) -> Result<Self> {
        let value = value.into();
        let declared = self
            .declared
            .as_ref()
            .and_then(|table| table.column_type(key));
        let column_type = match declared {
            Some(column_type) => column_type,
            None => self.registry.first(&value)?,
        };
        self.add_typed(column_type, key, value)
    }

    /// Column names in insertion order
    pub fn keys(&self) -> Vec<&str> {
        self.values.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn insert_sql(&self) -> Result<String> {
        if self.values.is_empty() {
            return Err(DatabaseError::unsupported(format!(
                "INSERT into {} without any values",
                self.table
            )));
        }
        let keys = self.keys();
        let placeholders = vec!["?"; keys.len()].join(", ");
        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            keys.join(", "),
            placeholders
        ))
    }

    fn bindings(&self) -> Vec<Binding> {
        self.values.iter().map(|(_, b)| b.clone()).collect()
    }

    /// Render the statement text and collect its bindings
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` when nothing was added
    pub fn build_as_raw(&self) -> Result<RawStatement> {
        Ok(RawStatement {
            sql: self.insert_sql()?,
            bindings: self.bindings(),
        })
    }

    pub fn build<D: Database + ?Sized>(&self, db: &D) -> Result<PreparedStatement> {
        self.build_as_raw()?.prepare(db)
    }

    /// Run the insert and return the number of inserted rows
    pub async fn send<D: Database + ?Sized>(&self, db: &D) -> Result<u64> {
        db.reconnect(false).await?;
        let statement = self.build(db)?;
        db.execute_update(&statement).await
    }
}

/// INSERT that updates the existing row when a key already exists
#[derive(Debug, Clone)]
pub struct UpsertBuilder {
    insert: InsertBuilder,
    conflict: Vec<String>,
}

impl UpsertBuilder {
    pub fn new(table: impl Into<String>, registry: Arc<TypeRegistry>) -> Self {
        Self {
            insert: InsertBuilder::new(table, registry),
            conflict: Vec::new(),
        }
    }

    /// Create an upsert over a declared table, keyed on its primary key
    pub fn for_table(table: &Table, registry: Arc<TypeRegistry>) -> Self {
        Self {
            insert: InsertBuilder::for_table(table, registry),
            conflict: table.primary_keys().iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Columns whose uniqueness decides between insert and update
    ///
    /// MySQL ignores these and uses every unique key of the table.
    #[must_use]
    pub fn conflict_on(mut self, columns: &[&str]) -> Self {
        self.conflict = columns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// See [`InsertBuilder::add_typed`]
    pub fn add_typed(
        mut self,
        column_type: Arc<dyn ColumnType>,
        key: &str,
        value: impl Into<DatabaseValue>,
    ) -> Result<Self> {
        self.insert = self.insert.add_typed(column_type, key, value)?;
        Ok(self)
    }

    /// See [`InsertBuilder::add`]
    pub fn add(mut self, key: &str, value: impl Into<DatabaseValue>) -> Result<Self> {
        self.insert = self.insert.add(key, value)?;
        Ok(self)
    }

    /// Render the statement for `dialect`
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` when nothing was added, or when a dialect
    /// other than MySQL has no conflict columns
    pub fn build_as_raw(&self, dialect: DatabaseType) -> Result<RawStatement> {
        let mut sql = self.insert.insert_sql()?;
        let keys = self.insert.keys();
        let updated: Vec<&str> = keys
            .iter()
            .copied()
            .filter(|k| !self.conflict.iter().any(|c| c == k))
            .collect();

        match dialect {
            DatabaseType::Mysql | DatabaseType::None => {
                // Re-assigning a key column is a harmless no-op update
                let targets = if updated.is_empty() { &keys } else { &updated };
                let assignments: Vec<String> = targets
                    .iter()
                    .map(|k| format!("{} = VALUES({})", k, k))
                    .collect();
                sql.push_str(" ON DUPLICATE KEY UPDATE ");
                sql.push_str(&assignments.join(", "));
            }
            DatabaseType::Postgres | DatabaseType::Sqlite => {
                if self.conflict.is_empty() {
                    return Err(DatabaseError::unsupported(format!(
                        "upsert on {} needs conflict columns for {}",
                        self.insert.table, dialect
                    )));
                }
                sql.push_str(&format!(" ON CONFLICT ({})", self.conflict.join(", ")));
                if updated.is_empty() {
                    sql.push_str(" DO NOTHING");
                } else {
                    let assignments: Vec<String> = updated
                        .iter()
                        .map(|k| format!("{} = excluded.{}", k, k))
                        .collect();
                    sql.push_str(" DO UPDATE SET ");
                    sql.push_str(&assignments.join(", "));
                }
            }
        }

        Ok(RawStatement {
            sql,
            bindings: self.insert.bindings(),
        })
    }

    pub fn build<D: Database + ?Sized>(&self, db: &D) -> Result<PreparedStatement> {
        self.build_as_raw(db.database_type())?.prepare(db)
    }

    /// Run the upsert and return the driver's affected-row count
    pub async fn send<D: Database + ?Sized>(&self, db: &D) -> Result<u64> {
        db.reconnect(false).await?;
        let statement = self.build(db)?;
        db.execute_update(&statement).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::{BigInt, Char, SmallInt, Text};
    use crate::core::schema::Column;
    use crate::core::where_builder::{OrderDirection, Where};

    fn registry() -> Arc<TypeRegistry> {
        Arc::new(TypeRegistry::with_builtins())
    }

    fn users() -> Table {
        Table::new("users")
            .column(Column::new("id", Arc::new(BigInt::new(20))).primary_key())
            .and_then(|t| t.column(Column::new("name", Arc::new(Text::new(255)))))
            .and_then(|t| t.column(Column::new("age", Arc::new(SmallInt::new(6)))))
            .unwrap()
    }

    #[test]
    fn test_select_builder() {
        let query = SelectBuilder::new("users").build_as_raw();
        assert_eq!(query.sql, "SELECT * FROM users");
        assert!(query.bindings.is_empty());

        let query = SelectBuilder::new("users")
            .columns(&["id", "name"])
            .filter(
                Where::new(registry())
                    .key("age")
                    .greater(17i16)
                    .unwrap()
                    .order_by("name", OrderDirection::Asc)
                    .limit(10),
            )
            .build_as_raw();
        assert_eq!(
            query.sql,
            "SELECT id, name FROM users WHERE age > ? ORDER BY name ASC LIMIT 10"
        );
        assert_eq!(query.bindings.len(), 1);
    }

    #[test]
    fn test_delete_builder() {
        let query = DeleteBuilder::new("users")
            .filter(Where::new(registry()).key("id").is_in([1i64, 2]).unwrap())
            .build_as_raw();
        assert_eq!(query.sql, "DELETE FROM users WHERE id IN (?, ?)");
        assert_eq!(query.bindings.len(), 2);
    }

    #[test]
    fn test_insert_builder() {
        let query = InsertBuilder::new("users", registry())
            .add("name", "Alice")
            .and_then(|b| b.add("age", 30i16))
            .and_then(|b| b.add("name", "Alicia"))
            .unwrap()
            .build_as_raw()
            .unwrap();
        assert_eq!(query.sql, "INSERT INTO users (name, age) VALUES (?, ?)");
        assert_eq!(query.bindings[0].value, DatabaseValue::from("Alicia"));
        assert_eq!(query.bindings[0].column_type.name(), "CHAR");
        assert_eq!(query.bindings[1].column_type.name(), "SMALLINT");
    }

    #[test]
    fn test_insert_uses_declared_types() {
        let query = InsertBuilder::for_table(&users(), registry())
            .add("name", "Bob")
            .and_then(|b| b.add("age", 40i64))
            .unwrap()
            .build_as_raw()
            .unwrap();
        assert_eq!(query.bindings[0].column_type.name(), "TEXT");
        assert_eq!(query.bindings[1].column_type.name(), "SMALLINT");
    }

    #[test]
    fn test_insert_type_checks() {
        let err = InsertBuilder::new("users", registry())
            .add_typed(Arc::new(Char::new(8)), "name", 3i64)
            .unwrap_err();
        assert!(matches!(err, DatabaseError::TypeMismatch { .. }));

        let err = InsertBuilder::new("users", registry())
            .build_as_raw()
            .unwrap_err();
        assert!(matches!(err, DatabaseError::UnsupportedOperation(_)));
    }

    #[test]
    fn test_upsert_dialects() {
        let upsert = UpsertBuilder::for_table(&users(), registry())
            .add("id", 1i64)
            .and_then(|b| b.add("name", "Alice"))
            .unwrap();

        assert_eq!(
            upsert.build_as_raw(DatabaseType::Mysql).unwrap().sql,
            "INSERT INTO users (id, name) VALUES (?, ?) ON DUPLICATE KEY UPDATE name = VALUES(name)"
        );
        assert_eq!(
            upsert.build_as_raw(DatabaseType::Sqlite).unwrap().sql,
            "INSERT INTO users (id, name) VALUES (?, ?) ON CONFLICT (id) DO UPDATE SET name = excluded.name"
        );
    }

    #[test]
    fn test_upsert_edge_cases() {
        let keys_only = UpsertBuilder::new("tags", registry())
            .conflict_on(&["tag"])
            .add("tag", "rust")
            .unwrap();
        assert_eq!(
            keys_only.build_as_raw(DatabaseType::Postgres).unwrap().sql,
            "INSERT INTO tags (tag) VALUES (?) ON CONFLICT (tag) DO NOTHING"
        );
        assert_eq!(
            keys_only.build_as_raw(DatabaseType::Mysql).unwrap().sql,
            "INSERT INTO tags (tag) VALUES (?) ON DUPLICATE KEY UPDATE tag = VALUES(tag)"
        );

        let no_keys = UpsertBuilder::new("tags", registry())
            .add("tag", "rust")
            .unwrap();
        assert!(matches!(
            no_keys.build_as_raw(DatabaseType::Sqlite),
            Err(DatabaseError::UnsupportedOperation(_))
        ));
    }
}
