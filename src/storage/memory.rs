use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::sql::schema::Column;
use crate::sql::types::Row;
use crate::storage::engine::Storage;

/// In-memory storage backend
///
/// Nothing survives the process; used by tests and throwaway sessions.
pub struct MemoryStorage {
    schema: BTreeMap<String, Vec<Column>>,
    rows: HashMap<String, Vec<Row>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            schema: BTreeMap::new(),
            rows: HashMap::new(),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn load_schema(&self) -> Result<BTreeMap<String, Vec<Column>>> {
        Ok(self.schema.clone())
    }

    fn persist_schema(&mut self, schema: &BTreeMap<String, Vec<Column>>) -> Result<()> {
        self.schema = schema.clone();
        Ok(())
    }

    fn load_rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(self.rows.get(table).cloned().unwrap_or_default())
    }

    fn persist_rows(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        self.rows.insert(table.to_string(), rows.to_vec());
        Ok(())
    }
}
