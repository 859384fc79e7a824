use std::collections::BTreeMap;

use crate::error::Result;
use crate::sql::schema::Column;
use crate::sql::types::Row;

/// Abstract persistence interface (whole-document operations)
///
/// Backends hold one schema document for the whole database plus one row
/// document per table. Every persist call replaces the stored document
/// wholesale; the durability unit is "the last persist won".
pub trait Storage {
    /// Loads the schema document, empty if nothing was ever persisted
    fn load_schema(&self) -> Result<BTreeMap<String, Vec<Column>>>;

    /// Replaces the schema document
    fn persist_schema(&mut self, schema: &BTreeMap<String, Vec<Column>>) -> Result<()>;

    /// Loads all rows of a table, empty if the table was never persisted
    fn load_rows(&self, table: &str) -> Result<Vec<Row>>;

    /// Replaces the stored rows of a table
    fn persist_rows(&mut self, table: &str, rows: &[Row]) -> Result<()>;
}

#[cfg(test)]
pub mod tests {
    use super::Storage;
    use crate::{
        error::Result,
        sql::schema::Column,
        sql::types::{DataType, Value},
        storage::memory::MemoryStorage,
    };
    use std::collections::BTreeMap;

    /// Shared conformance test, run against every backend
    pub(crate) fn test_storage_ops(mut storage: impl Storage) -> Result<()> {
        // Fresh backends report empty documents rather than errors
        assert_eq!(storage.load_schema()?, BTreeMap::new());
        assert_eq!(storage.load_rows("users")?, Vec::<Vec<Value>>::new());

        let mut schema = BTreeMap::new();
        schema.insert(
            "users".to_string(),
            vec![
                Column {
                    name: "id".to_string(),
                    datatype: DataType::Integer,
                    primary_key: true,
                    unique: false,
                },
                Column {
                    name: "name".to_string(),
                    datatype: DataType::Text,
                    primary_key: false,
                    unique: false,
                },
            ],
        );
        storage.persist_schema(&schema)?;
        assert_eq!(storage.load_schema()?, schema);

        let rows = vec![
            vec![Value::Integer(1), Value::Text("Alice".to_string())],
            vec![Value::Integer(2), Value::Null],
        ];
        storage.persist_rows("users", &rows)?;
        assert_eq!(storage.load_rows("users")?, rows);

        // Tables are independent documents
        assert_eq!(storage.load_rows("posts")?, Vec::<Vec<Value>>::new());

        // A second persist replaces the first
        storage.persist_rows("users", &rows[..1])?;
        assert_eq!(storage.load_rows("users")?, rows[..1].to_vec());
        Ok(())
    }

    #[test]
    fn test_memory_storage() -> Result<()> {
        test_storage_ops(MemoryStorage::new())
    }
}
