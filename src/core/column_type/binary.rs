use super::{mismatch, read_column, ColumnFlags, ColumnType, SqlCode};
use crate::core::error::Result;
use crate::core::statement::PreparedStatement;
use crate::core::value::{DatabaseRow, DatabaseValue, ValueKind};

/// `BLOB`: raw bytes
#[derive(Debug, Clone, Default)]
pub struct Blob;

impl Blob {
    pub fn new() -> Self {
        Self
    }
}

impl ColumnType for Blob {
    fn name(&self) -> &'static str {
        "BLOB"
    }

    fn native_kind(&self) -> ValueKind {
        ValueKind::Bytes
    }

    fn sql_code(&self) -> SqlCode {
        SqlCode::Blob
    }

    fn flags(&self) -> ColumnFlags {
        ColumnFlags {
            allow_not_null: true,
            ..ColumnFlags::default()
        }
    }

    fn encode(
        &self,
        statement: &mut PreparedStatement,
        index: usize,
        value: &DatabaseValue,
    ) -> Result<()> {
        match value {
            DatabaseValue::Null | DatabaseValue::Bytes(_) => statement.set(index, value.clone()),
            other => Err(mismatch(self, other)),
        }
    }

    fn decode(&self, row: &DatabaseRow, column: &str) -> Result<Option<DatabaseValue>> {
        let Some(value) = read_column(row, column)? else {
            return Ok(None);
        };
        value
            .as_bytes()
            .map(|bytes| Some(DatabaseValue::Bytes(bytes.to_vec())))
            .ok_or_else(|| mismatch(self, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::column_type::tests::row_of;

    #[test]
    fn test_blob() {
        let mut stmt = PreparedStatement::new("SELECT ?");
        Blob.encode(&mut stmt, 1, &DatabaseValue::Bytes(vec![0, 255]))
            .unwrap();
        assert!(Blob.encode(&mut stmt, 1, &DatabaseValue::from("x")).is_err());

        let row = row_of("b", DatabaseValue::Bytes(vec![1, 2]));
        assert_eq!(
            Blob.decode(&row, "b").unwrap(),
            Some(DatabaseValue::Bytes(vec![1, 2]))
        );
        assert!(!Blob.flags().allow_primary_key);
    }
}
