use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::sql::schema::Column;
use crate::sql::table::Table;
use crate::storage::engine::Storage;

/// The table registry, backed by a single schema document
///
/// Opening the catalog reads the schema document and reconstructs every
/// recorded table; each table then loads its own row document. Creating a
/// table registers it and rewrites the schema document immediately. Tables
/// are never dropped.
pub struct Catalog<S: Storage> {
    tables: BTreeMap<String, Table<S>>,
    storage: Arc<Mutex<S>>,
}

impl<S: Storage> Catalog<S> {
    /// Opens the catalog from the given storage handle
    pub fn open(storage: Arc<Mutex<S>>) -> Result<Self> {
        let schema = storage.lock()?.load_schema()?;
        let mut tables = BTreeMap::new();
        for (name, columns) in schema {
            let table = Table::open(name.clone(), columns, storage.clone())?;
            tables.insert(name, table);
        }
        tracing::debug!("catalog opened with {} table(s)", tables.len());
        Ok(Catalog { tables, storage })
    }

    /// Registers a table and persists the schema document
    ///
    /// Re-using an existing name replaces the registration; the table's
    /// previously persisted rows are reinterpreted under the new columns.
    pub fn create_table(&mut self, name: String, columns: Vec<Column>) -> Result<()> {
        let table = Table::open(name.clone(), columns, self.storage.clone())?;
        self.tables.insert(name.clone(), table);
        self.persist_schema()?;
        tracing::debug!("created table {}", name);
        Ok(())
    }

    /// Looks up a table by name
    pub fn table(&self, name: &str) -> Result<&Table<S>> {
        self.tables
            .get(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    /// Looks up a table by name for mutation
    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table<S>> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| Error::TableNotFound(name.to_string()))
    }

    fn persist_schema(&self) -> Result<()> {
        let schema: BTreeMap<String, Vec<Column>> = self
            .tables
            .iter()
            .map(|(name, table)| (name.clone(), table.columns().to_vec()))
            .collect();
        self.storage.lock()?.persist_schema(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::Catalog;
    use crate::{
        error::{Error, Result},
        sql::schema::Column,
        sql::types::{DataType, Value},
        storage::memory::MemoryStorage,
    };
    use std::sync::{Arc, Mutex};

    fn columns() -> Vec<Column> {
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
        ]
    }

    #[test]
    fn test_catalog_reopen_reconstructs_tables() -> Result<()> {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));

        let mut catalog = Catalog::open(storage.clone())?;
        catalog.create_table("users".to_string(), columns())?;
        catalog
            .table_mut("users")?
            .insert(vec![Value::Integer(1), Value::Text("Alice".to_string())])?;
        drop(catalog);

        let catalog = Catalog::open(storage)?;
        let table = catalog.table("users")?;
        assert_eq!(table.columns(), columns().as_slice());
        assert_eq!(
            table.select(None, None),
            vec![vec![Value::Integer(1), Value::Text("Alice".to_string())]]
        );
        Ok(())
    }

    #[test]
    fn test_catalog_unknown_table() -> Result<()> {
        let catalog = Catalog::open(Arc::new(Mutex::new(MemoryStorage::new())))?;
        match catalog.table("ghosts") {
            Err(Error::TableNotFound(name)) => assert_eq!(name, "ghosts"),
            other => panic!("expected table-not-found, got {:?}", other.err()),
        }
        Ok(())
    }

    #[test]
    fn test_create_table_twice_replaces_registration() -> Result<()> {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        let mut catalog = Catalog::open(storage)?;

        catalog.create_table("users".to_string(), columns())?;
        catalog
            .table_mut("users")?
            .insert(vec![Value::Integer(1), Value::Text("Alice".to_string())])?;

        // The new registration sees the old row document under the new columns
        catalog.create_table(
            "users".to_string(),
            vec![Column {
                name: "id".to_string(),
                datatype: DataType::Integer,
                primary_key: true,
                unique: false,
            }],
        )?;
        assert_eq!(
            catalog.table("users")?.select(None, None),
            vec![vec![Value::Integer(1)]]
        );
        Ok(())
    }
}
