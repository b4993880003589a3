//! Table and column declarations
//!
//! A [`Table`] is an ordered list of typed [`Column`]s. Each column is checked
//! against its column type's [`ColumnFlags`](super::column_type::ColumnFlags) when
//! it is added, so a table that exists is a table whose DDL is valid for its types.

use super::column_type::ColumnType;
use super::error::{DatabaseError, Result};
use super::value::DatabaseValue;
use std::sync::Arc;

/// One column declaration
#[derive(Debug, Clone)]
#[must_use]
pub struct Column {
    name: String,
    column_type: Arc<dyn ColumnType>,
    primary_key: bool,
    not_null: bool,
    unique: bool,
    zero_fill: bool,
    auto_increment: bool,
    default_value: Option<DatabaseValue>,
}

impl Column {
    /// Declare a column of `column_type` with no constraints
    pub fn new(name: impl Into<String>, column_type: Arc<dyn ColumnType>) -> Self {
        Self {
            name: name.into(),
            column_type,
            primary_key: false,
            not_null: false,
            unique: false,
            zero_fill: false,
            auto_increment: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn zero_fill(mut self) -> Self {
        self.zero_fill = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    /// Set a literal default, overriding the column type's own default
    pub fn default_value(mut self, value: impl Into<DatabaseValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn column_type(&self) -> &Arc<dyn ColumnType> {
        &self.column_type
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Check every requested constraint against the column type
    fn validate(&self) -> Result<()> {
        let flags = self.column_type.flags();
        let type_name = self.column_type.name();
        let checks = [
            (self.primary_key, flags.allow_primary_key, "PRIMARY KEY"),
            (self.not_null, flags.allow_not_null, "NOT NULL"),
            (self.unique, flags.allow_unique, "UNIQUE"),
            (self.zero_fill, flags.allow_zero_fill, "ZEROFILL"),
            (self.auto_increment, flags.allow_auto_increment, "AUTO_INCREMENT"),
            (self.default_value.is_some(), flags.allow_default, "DEFAULT"),
        ];
        for (requested, allowed, constraint) in checks {
            if requested && !allowed {
                return Err(DatabaseError::invalid_column(
                    &self.name,
                    format!("{} does not allow {}", type_name, constraint),
                ));
            }
        }

        if let Some(value) = &self.default_value {
            if !self.column_type.accepts(value) {
                return Err(DatabaseError::invalid_column(
                    &self.name,
                    format!("default of kind {} does not fit {}", value.kind(), type_name),
                ));
            }
        }
        Ok(())
    }

    /// Column definition as it appears inside `CREATE TABLE`
    pub fn definition(&self) -> String {
        let mut sql = format!("{} {}", self.name, self.column_type.declaration());
        if self.column_type.flags().is_unsigned {
            sql.push_str(" UNSIGNED");
        }
        if self.zero_fill {
            sql.push_str(" ZEROFILL");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.auto_increment {
            sql.push_str(" AUTO_INCREMENT");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        let default = self
            .default_value
            .as_ref()
            .map(render_literal)
            .or_else(|| self.column_type.default_literal());
        if let Some(default) = default {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default);
        }
        sql
    }
}

/// Render a value as an SQL literal for DDL
fn render_literal(value: &DatabaseValue) -> String {
    match value {
        DatabaseValue::Null => "NULL".to_string(),
        DatabaseValue::Bool(true) => "1".to_string(),
        DatabaseValue::Bool(false) => "0".to_string(),
        DatabaseValue::String(_) | DatabaseValue::DateTime(_) => {
            format!("'{}'", value.as_string().replace('\'', "''"))
        }
        DatabaseValue::Bytes(bytes) => {
            let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
            format!("X'{}'", hex)
        }
        other => other.as_string(),
    }
}

/// A named table and its columns in declaration order
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Add a column
    ///
    /// # Errors
    ///
    /// Returns `InvalidColumn` when the name is already taken or the column type
    /// does not allow one of the requested constraints
    pub fn column(mut self, column: Column) -> Result<Self> {
        if self.get(column.name()).is_some() {
            return Err(DatabaseError::invalid_column(
                column.name(),
                format!("already declared on table {}", self.name),
            ));
        }
        column.validate()?;
        self.columns.push(column);
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Find a column by name
    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Declared type of the named column
    pub fn column_type(&self, name: &str) -> Option<Arc<dyn ColumnType>> {
        self.get(name).map(|c| Arc::clone(&c.column_type))
    }

    /// Names of the primary key columns, in declaration order
    pub fn primary_keys(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.primary_key)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// `CREATE TABLE IF NOT EXISTS` statement for this table
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedOperation` for a table without columns
    pub fn create_sql(&self) -> Result<String> {
        if self.columns.is_empty() {
            return Err(DatabaseError::unsupported(format!(
                "table {} has no columns",
                self.name
            )));
        }
        let mut parts: Vec<String> = self.columns.iter().map(Column::definition).collect();
        let keys = self.primary_keys();
        if !keys.is_empty() {
            parts.push(format!("PRIMARY KEY ({})", keys.join(", ")));
        }
        Ok(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.name,
            parts.join(", ")
        ))
    }
}
