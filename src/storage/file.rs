use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::Result;
use crate::sql::schema::Column;
use crate::sql::types::Row;
use crate::storage::engine::Storage;

/// File-backed storage: JSON documents under a data directory
///
/// Layout:
///   schema.json   - table name to column list
///   {table}.json  - array of row arrays, e.g. [[1,"Alice",null]]
///
/// Each persist rewrites the target file in place. A crash mid-write can
/// leave a truncated document behind; there is no write-ahead log.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens the backend rooted at `dir`, creating the directory if needed
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn schema_path(&self) -> PathBuf {
        self.dir.join("schema.json")
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{}.json", table))
    }

    fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let reader = BufReader::new(File::open(path)?);
        Ok(Some(serde_json::from_reader(reader)?))
    }

    fn write_document<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn load_schema(&self) -> Result<BTreeMap<String, Vec<Column>>> {
        Ok(Self::read_document(&self.schema_path())?.unwrap_or_default())
    }

    fn persist_schema(&mut self, schema: &BTreeMap<String, Vec<Column>>) -> Result<()> {
        Self::write_document(&self.schema_path(), schema)
    }

    fn load_rows(&self, table: &str) -> Result<Vec<Row>> {
        Ok(Self::read_document(&self.table_path(table))?.unwrap_or_default())
    }

    fn persist_rows(&mut self, table: &str, rows: &[Row]) -> Result<()> {
        Self::write_document(&self.table_path(table), rows)
    }
}

#[cfg(test)]
mod tests {
    use super::FileStorage;
    use crate::{
        error::Result,
        sql::schema::Column,
        sql::types::{DataType, Value},
        storage::engine::Storage,
    };
    use std::collections::BTreeMap;

    #[test]
    fn test_file_storage_conformance() -> Result<()> {
        let dir = tempfile::tempdir()?;
        crate::storage::engine::tests::test_storage_ops(FileStorage::new(dir.path())?)
    }

    #[test]
    fn test_file_storage_survives_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;

        let mut schema = BTreeMap::new();
        schema.insert(
            "users".to_string(),
            vec![Column {
                name: "id".to_string(),
                datatype: DataType::Integer,
                primary_key: true,
                unique: false,
            }],
        );
        let rows = vec![vec![Value::Integer(1)], vec![Value::Integer(2)]];

        {
            let mut storage = FileStorage::new(dir.path())?;
            storage.persist_schema(&schema)?;
            storage.persist_rows("users", &rows)?;
        }

        // A fresh handle on the same directory sees the persisted state
        let storage = FileStorage::new(dir.path())?;
        assert_eq!(storage.load_schema()?, schema);
        assert_eq!(storage.load_rows("users")?, rows);
        Ok(())
    }

    #[test]
    fn test_file_storage_document_shape() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut storage = FileStorage::new(dir.path())?;
        storage.persist_rows(
            "users",
            &[vec![
                Value::Integer(1),
                Value::Text("Alice".to_string()),
                Value::Null,
            ]],
        )?;

        // Rows land on disk as plain JSON arrays
        let text = std::fs::read_to_string(dir.path().join("users.json"))?;
        let parsed: serde_json::Value = serde_json::from_str(&text)?;
        assert_eq!(parsed, serde_json::json!([[1, "Alice", null]]));
        Ok(())
    }
}
