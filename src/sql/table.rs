use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::sql::schema::Column;
use crate::sql::types::{Row, Value};
use crate::storage::engine::Storage;

/// One table: column definitions, the row sequence, and uniqueness indexes
///
/// Rows are positional, following the declared column order. For every
/// column marked primary key or unique an index maps value to row position;
/// the index must mirror the row sequence after every mutation. Null values
/// are never indexed, so uniqueness does not constrain them.
///
/// Every mutation rewrites the table's whole row document through the shared
/// storage handle. There is no write-ahead log and no atomic replace; a
/// write interrupted mid-flight can leave a truncated document behind.
pub struct Table<S: Storage> {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    indexes: BTreeMap<String, HashMap<Value, usize>>,
    storage: Arc<Mutex<S>>,
}

impl<S: Storage> Table<S> {
    /// Opens a table, loading any previously persisted rows
    ///
    /// Loaded rows are normalized to the declared column count: missing
    /// trailing fields become Null, extra fields are dropped. This keeps a
    /// row document readable after the table was re-created with a
    /// different column list.
    pub fn open(
        name: impl Into<String>,
        columns: Vec<Column>,
        storage: Arc<Mutex<S>>,
    ) -> Result<Self> {
        let name = name.into();
        let mut rows = storage.lock()?.load_rows(&name)?;
        for row in &mut rows {
            row.resize(columns.len(), Value::Null);
        }

        let mut table = Table {
            name,
            columns,
            rows,
            indexes: BTreeMap::new(),
            storage,
        };
        table.rebuild_indexes();
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Looks up a declared column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Position of a declared column in the row layout
    fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Appends one row, already coerced and ordered by the declared columns
    ///
    /// Fails with a constraint violation if any indexed column's value is
    /// already present in its index; the row is not appended in that case.
    /// On success the indexes are updated incrementally and the row
    /// sequence is persisted.
    pub fn insert(&mut self, row: Row) -> Result<usize> {
        for (pos, column) in self.columns.iter().enumerate() {
            if !column.indexed() || row[pos].is_null() {
                continue;
            }
            if let Some(index) = self.indexes.get(&column.name) {
                if index.contains_key(&row[pos]) {
                    return Err(Error::ConstraintViolation {
                        column: column.name.clone(),
                        value: row[pos].clone(),
                    });
                }
            }
        }

        self.rows.push(row);
        let position = self.rows.len() - 1;
        for (pos, column) in self.columns.iter().enumerate() {
            if !column.indexed() || self.rows[position][pos].is_null() {
                continue;
            }
            if let Some(index) = self.indexes.get_mut(&column.name) {
                index.insert(self.rows[position][pos].clone(), position);
            }
        }

        self.persist()?;
        tracing::debug!("inserted 1 row into table {}", self.name);
        Ok(1)
    }

    /// Linear scan returning independent copies of the matching rows
    ///
    /// `columns` of None selects every declared column in order; otherwise
    /// rows are projected to the requested names, with Null standing in
    /// for a name that is not declared. A predicate naming an undeclared
    /// column matches nothing.
    pub fn select(
        &self,
        columns: Option<&[String]>,
        predicate: Option<&(String, Value)>,
    ) -> Vec<Row> {
        self.rows
            .iter()
            .filter(|row| self.row_matches(row, predicate))
            .map(|row| match columns {
                None => row.clone(),
                Some(names) => names
                    .iter()
                    .map(|name| match self.column_position(name) {
                        Some(pos) => row[pos].clone(),
                        None => Value::Null,
                    })
                    .collect(),
            })
            .collect()
    }

    /// Removes every matching row (all rows when the predicate is absent)
    ///
    /// Survivors keep their relative order. Indexes are rebuilt from the
    /// surviving sequence and the document is persisted even when nothing
    /// matched.
    pub fn delete(&mut self, predicate: Option<&(String, Value)>) -> Result<usize> {
        let before = self.rows.len();
        let columns = &self.columns;
        self.rows
            .retain(|row| !row_matches_columns(columns, row, predicate));
        let count = before - self.rows.len();

        self.rebuild_indexes();
        self.persist()?;
        tracing::debug!("deleted {} row(s) from table {}", count, self.name);
        Ok(count)
    }

    /// Applies the assignments to every matching row, all or nothing
    ///
    /// The new row sequence is built on a copy and validated as a whole:
    /// if any indexed column would end up with a duplicated non-null
    /// value, the update fails and the table is left untouched, in memory
    /// and on disk. On success the copy is swapped in, indexes follow, and
    /// the sequence is persisted once. A call matching zero rows does not
    /// persist.
    pub fn update(
        &mut self,
        assignments: &BTreeMap<String, Value>,
        predicate: Option<&(String, Value)>,
    ) -> Result<usize> {
        let mut updated = self.rows.clone();
        let mut count = 0;
        for row in updated.iter_mut() {
            if !row_matches_columns(&self.columns, row, predicate) {
                continue;
            }
            for (column, value) in assignments {
                if let Some(pos) = self.columns.iter().position(|c| &c.name == column) {
                    row[pos] = value.clone();
                }
            }
            count += 1;
        }
        if count == 0 {
            return Ok(0);
        }

        // Validate the whole candidate sequence before touching anything
        let mut indexes = BTreeMap::new();
        for (pos, column) in self.columns.iter().enumerate() {
            if !column.indexed() {
                continue;
            }
            let mut index = HashMap::new();
            for (i, row) in updated.iter().enumerate() {
                if row[pos].is_null() {
                    continue;
                }
                if index.insert(row[pos].clone(), i).is_some() {
                    return Err(Error::ConstraintViolation {
                        column: column.name.clone(),
                        value: row[pos].clone(),
                    });
                }
            }
            indexes.insert(column.name.clone(), index);
        }

        self.rows = updated;
        self.indexes = indexes;
        self.persist()?;
        tracing::debug!("updated {} row(s) in table {}", count, self.name);
        Ok(count)
    }

    /// Tests one row against the optional equality predicate
    fn row_matches(&self, row: &Row, predicate: Option<&(String, Value)>) -> bool {
        row_matches_columns(&self.columns, row, predicate)
    }

    /// Rebuilds every index from the current row sequence
    ///
    /// Null values are skipped; if the sequence already violates
    /// uniqueness (say, a hand-edited document), the later position wins.
    fn rebuild_indexes(&mut self) {
        self.indexes.clear();
        for (pos, column) in self.columns.iter().enumerate() {
            if !column.indexed() {
                continue;
            }
            let mut index = HashMap::new();
            for (i, row) in self.rows.iter().enumerate() {
                if !row[pos].is_null() {
                    index.insert(row[pos].clone(), i);
                }
            }
            self.indexes.insert(column.name.clone(), index);
        }
    }

    fn persist(&self) -> Result<()> {
        self.storage.lock()?.persist_rows(&self.name, &self.rows)
    }
}

fn row_matches_columns(
    columns: &[Column],
    row: &Row,
    predicate: Option<&(String, Value)>,
) -> bool {
    match predicate {
        Some((column, value)) => match columns.iter().position(|c| &c.name == column) {
            Some(pos) => &row[pos] == value,
            None => false,
        },
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::Table;
    use crate::{
        error::{Error, Result},
        sql::schema::Column,
        sql::types::{DataType, Value},
        storage::{engine::Storage, memory::MemoryStorage},
    };
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    fn users_columns() -> Vec<Column> {
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
                unique: true,
            },
        ]
    }

    fn users_table() -> Result<(Table<MemoryStorage>, Arc<Mutex<MemoryStorage>>)> {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        let table = Table::open("users", users_columns(), storage.clone())?;
        Ok((table, storage))
    }

    fn row(id: i64, name: &str) -> Vec<Value> {
        vec![Value::Integer(id), Value::Text(name.to_string())]
    }

    #[test]
    fn test_insert_and_select() -> Result<()> {
        let (mut table, _) = users_table()?;
        assert_eq!(table.insert(row(1, "Alice"))?, 1);
        assert_eq!(table.insert(row(2, "Bob"))?, 1);

        assert_eq!(table.select(None, None), vec![row(1, "Alice"), row(2, "Bob")]);
        assert_eq!(
            table.select(None, Some(&("id".to_string(), Value::Integer(2)))),
            vec![row(2, "Bob")]
        );
        // A predicate naming an undeclared column matches nothing
        assert_eq!(
            table.select(None, Some(&("age".to_string(), Value::Integer(2)))),
            Vec::<Vec<Value>>::new()
        );
        Ok(())
    }

    #[test]
    fn test_projection() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(1, "Alice"))?;

        let names = vec!["name".to_string(), "id".to_string()];
        assert_eq!(
            table.select(Some(names.as_slice()), None),
            vec![vec![Value::Text("Alice".to_string()), Value::Integer(1)]]
        );

        // Undeclared projection columns come back as Null
        let names = vec!["id".to_string(), "age".to_string()];
        assert_eq!(
            table.select(Some(names.as_slice()), None),
            vec![vec![Value::Integer(1), Value::Null]]
        );
        Ok(())
    }

    #[test]
    fn test_insert_duplicate_rejected() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(1, "Alice"))?;
        table.insert(row(2, "Bob"))?;

        match table.insert(row(3, "Alice")) {
            Err(Error::ConstraintViolation { column, value }) => {
                assert_eq!(column, "name");
                assert_eq!(value, Value::Text("Alice".to_string()));
            }
            other => panic!("expected constraint violation, got {:?}", other),
        }
        // The failed insert left the table unchanged
        assert_eq!(table.select(None, None).len(), 2);
        Ok(())
    }

    #[test]
    fn test_null_exempt_from_uniqueness() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(vec![Value::Integer(1), Value::Null])?;
        table.insert(vec![Value::Integer(2), Value::Null])?;
        assert_eq!(table.select(None, None).len(), 2);
        Ok(())
    }

    #[test]
    fn test_delete_preserves_survivor_order() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(101, "a"))?;
        table.insert(row(102, "b"))?;
        table.insert(row(103, "c"))?;

        assert_eq!(
            table.delete(Some(&("id".to_string(), Value::Integer(102))))?,
            1
        );
        assert_eq!(table.select(None, None), vec![row(101, "a"), row(103, "c")]);

        // Deleting with no match changes nothing
        assert_eq!(
            table.delete(Some(&("id".to_string(), Value::Integer(999))))?,
            0
        );
        assert_eq!(table.select(None, None), vec![row(101, "a"), row(103, "c")]);

        // A freed value is insertable again
        table.insert(row(102, "b"))?;
        assert_eq!(table.select(None, None).len(), 3);
        Ok(())
    }

    #[test]
    fn test_delete_without_predicate_clears_table() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(1, "Alice"))?;
        table.insert(row(2, "Bob"))?;
        assert_eq!(table.delete(None)?, 2);
        assert!(table.select(None, None).is_empty());
        Ok(())
    }

    #[test]
    fn test_update() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(1, "Alice"))?;
        table.insert(row(2, "Bob"))?;

        let assignments: BTreeMap<String, Value> =
            [("name".to_string(), Value::Text("Bobby".to_string()))]
                .into_iter()
                .collect();
        assert_eq!(
            table.update(&assignments, Some(&("id".to_string(), Value::Integer(2))))?,
            1
        );
        assert_eq!(
            table.select(None, Some(&("id".to_string(), Value::Integer(2)))),
            vec![row(2, "Bobby")]
        );

        // The freed value is usable, the new one is taken
        table.insert(row(3, "Bob"))?;
        assert!(table.insert(row(4, "Bobby")).is_err());
        Ok(())
    }

    #[test]
    fn test_update_is_all_or_nothing() -> Result<()> {
        let (mut table, storage) = users_table()?;
        table.insert(row(1, "Alice"))?;
        table.insert(row(2, "Bob"))?;
        table.insert(row(3, "Carol"))?;

        // Updating every row to the same unique value must fail as a whole
        let assignments: BTreeMap<String, Value> =
            [("name".to_string(), Value::Text("Dave".to_string()))]
                .into_iter()
                .collect();
        match table.update(&assignments, None) {
            Err(Error::ConstraintViolation { column, .. }) => assert_eq!(column, "name"),
            other => panic!("expected constraint violation, got {:?}", other),
        }

        // No row was touched, not even the first match
        assert_eq!(
            table.select(None, None),
            vec![row(1, "Alice"), row(2, "Bob"), row(3, "Carol")]
        );
        // And nothing was persisted
        assert_eq!(
            storage.lock().unwrap().load_rows("users")?,
            vec![row(1, "Alice"), row(2, "Bob"), row(3, "Carol")]
        );
        Ok(())
    }

    #[test]
    fn test_update_matching_nothing_counts_zero() -> Result<()> {
        let (mut table, _) = users_table()?;
        table.insert(row(1, "Alice"))?;
        let assignments: BTreeMap<String, Value> =
            [("name".to_string(), Value::Text("Zoe".to_string()))]
                .into_iter()
                .collect();
        assert_eq!(
            table.update(&assignments, Some(&("id".to_string(), Value::Integer(9))))?,
            0
        );
        assert_eq!(table.select(None, None), vec![row(1, "Alice")]);
        Ok(())
    }

    #[test]
    fn test_reopen_restores_rows_and_indexes() -> Result<()> {
        let (mut table, storage) = users_table()?;
        table.insert(row(1, "Alice"))?;
        table.insert(row(2, "Bob"))?;
        drop(table);

        let mut table = Table::open("users", users_columns(), storage)?;
        assert_eq!(table.select(None, None), vec![row(1, "Alice"), row(2, "Bob")]);
        // Uniqueness still holds after the index rebuild
        assert!(table.insert(row(3, "Alice")).is_err());
        Ok(())
    }

    #[test]
    fn test_open_normalizes_row_arity() -> Result<()> {
        let storage = Arc::new(Mutex::new(MemoryStorage::new()));
        storage.lock().unwrap().persist_rows(
            "users",
            &[
                vec![Value::Integer(1)],
                vec![
                    Value::Integer(2),
                    Value::Text("Bob".to_string()),
                    Value::Integer(99),
                ],
            ],
        )?;

        let table = Table::open("users", users_columns(), storage)?;
        assert_eq!(
            table.select(None, None),
            vec![
                vec![Value::Integer(1), Value::Null],
                vec![Value::Integer(2), Value::Text("Bob".to_string())],
            ]
        );
        Ok(())
    }
}
