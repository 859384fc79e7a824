use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::{Arc, Mutex};

use crate::error::{Error, Result};
use crate::sql::catalog::Catalog;
use crate::sql::parser::Parser;
use crate::sql::parser::ast::{JoinClause, Literal, Projection, Statement};
use crate::sql::schema::Column;
use crate::sql::table::Table;
use crate::sql::types::{DataType, Row, Value};
use crate::storage::engine::Storage;

mod join;

/// The database: one catalog over one storage backend, executing statements
///
/// This is the single entry point. A statement string goes in, a
/// [StatementResult] or an error comes out; all mutation and persistence
/// happen before the call returns.
pub struct Database<S: Storage> {
    catalog: Catalog<S>,
}

impl<S: Storage> Database<S> {
    /// Opens a database over the given storage backend
    pub fn open(storage: S) -> Result<Self> {
        let storage = Arc::new(Mutex::new(storage));
        Ok(Database {
            catalog: Catalog::open(storage)?,
        })
    }

    /// Executes one statement
    ///
    /// Blank input is accepted and produces [StatementResult::Empty].
    pub fn execute(&mut self, statement: &str) -> Result<StatementResult> {
        let statement = statement.trim();
        if statement.is_empty() {
            return Ok(StatementResult::Empty);
        }
        tracing::debug!("executing: {}", statement);

        match Parser::new(statement).parse()? {
            Statement::CreateTable { name, columns } => {
                let columns = columns
                    .into_iter()
                    .map(|spec| Column {
                        name: spec.name,
                        datatype: spec.datatype,
                        primary_key: spec.primary_key,
                        unique: spec.unique,
                    })
                    .collect();
                self.catalog.create_table(name.clone(), columns)?;
                Ok(StatementResult::CreateTable { name })
            }
            Statement::Insert {
                table,
                columns,
                values,
            } => self.insert(&table, columns, values),
            Statement::Select {
                projection,
                table,
                join,
                predicate,
            } => self.select(&table, projection, join, predicate),
            Statement::Update {
                table,
                assignments,
                predicate,
            } => self.update(&table, assignments, predicate),
            Statement::Delete { table, predicate } => {
                let predicate = coerce_predicate(self.catalog.table(&table)?, predicate)?;
                let count = self.catalog.table_mut(&table)?.delete(predicate.as_ref())?;
                Ok(StatementResult::Delete { count })
            }
        }
    }

    fn insert(
        &mut self,
        table: &str,
        columns: Vec<String>,
        values: Vec<Literal>,
    ) -> Result<StatementResult> {
        let mut provided = BTreeMap::new();
        {
            let table = self.catalog.table(table)?;
            // Zip truncates: surplus values (or surplus columns) are dropped
            for (name, literal) in columns.iter().zip(values.iter()) {
                let column = table.column(name).ok_or_else(|| Error::ColumnNotFound {
                    table: table.name().to_string(),
                    column: name.clone(),
                })?;
                provided.insert(name.clone(), coerce(literal, column)?);
            }
        }

        let table = self.catalog.table_mut(table)?;
        let row: Row = table
            .columns()
            .iter()
            .map(|column| provided.remove(&column.name).unwrap_or(Value::Null))
            .collect();
        let count = table.insert(row)?;
        Ok(StatementResult::Insert { count })
    }

    fn select(
        &self,
        table: &str,
        projection: Projection,
        join: Option<JoinClause>,
        predicate: Option<(String, Literal)>,
    ) -> Result<StatementResult> {
        let left = self.catalog.table(table)?;
        // The predicate literal is coerced against the left table only,
        // even for joins
        let predicate = coerce_predicate(left, predicate)?;

        if let Some(clause) = join {
            let right = self.catalog.table(&clause.table)?;
            let (columns, rows) = join::nested_loop_join(left, right, &clause, predicate.as_ref());
            return Ok(StatementResult::Rows { columns, rows });
        }

        let (columns, rows) = match projection {
            Projection::All => (
                left.columns().iter().map(|c| c.name.clone()).collect(),
                left.select(None, predicate.as_ref()),
            ),
            Projection::Columns(names) => {
                let rows = left.select(Some(names.as_slice()), predicate.as_ref());
                (names, rows)
            }
        };
        Ok(StatementResult::Rows { columns, rows })
    }

    fn update(
        &mut self,
        table: &str,
        assignments: BTreeMap<String, Literal>,
        predicate: Option<(String, Literal)>,
    ) -> Result<StatementResult> {
        let (assignments, predicate) = {
            let table = self.catalog.table(table)?;
            let mut coerced = BTreeMap::new();
            for (name, literal) in assignments {
                let column = table.column(&name).ok_or_else(|| Error::ColumnNotFound {
                    table: table.name().to_string(),
                    column: name.clone(),
                })?;
                coerced.insert(name, coerce(&literal, column)?);
            }
            (coerced, coerce_predicate(table, predicate)?)
        };

        let count = self
            .catalog
            .table_mut(table)?
            .update(&assignments, predicate.as_ref())?;
        Ok(StatementResult::Update { count })
    }
}

/// Coerces a literal against a declared column
///
/// Quoting never matters here: `'5'` inserts as the integer 5 into an INT
/// column, and the bare token `104` inserts as the text "104" into a TEXT
/// column. Only a non-numeric literal against an INT column fails.
fn coerce(literal: &Literal, column: &Column) -> Result<Value> {
    match column.datatype {
        DataType::Integer => match literal.raw().parse::<i64>() {
            Ok(n) => Ok(Value::Integer(n)),
            Err(_) => Err(Error::TypeMismatch {
                column: column.name.clone(),
                value: literal.raw().to_string(),
                datatype: column.datatype,
            }),
        },
        DataType::Text => Ok(Value::Text(literal.raw().to_string())),
    }
}

/// Coerces a predicate literal, leniently
///
/// The literal is coerced only when the column is declared on the table;
/// an undeclared column keeps its text form and will match nothing.
fn coerce_predicate<S: Storage>(
    table: &Table<S>,
    predicate: Option<(String, Literal)>,
) -> Result<Option<(String, Value)>> {
    match predicate {
        None => Ok(None),
        Some((name, literal)) => {
            let value = match table.column(&name) {
                Some(column) => coerce(&literal, column)?,
                None => Value::Text(literal.raw().to_string()),
            };
            Ok(Some((name, value)))
        }
    }
}

/// Execution result
#[derive(Debug, PartialEq)]
pub enum StatementResult {
    CreateTable { name: String },
    Insert { count: usize },
    Rows { columns: Vec<String>, rows: Vec<Row> },
    Update { count: usize },
    Delete { count: usize },
    Empty,
}

impl Display for StatementResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementResult::CreateTable { name } => write!(f, "Table {} created.", name),
            StatementResult::Insert { count } => write!(f, "{} row(s) inserted.", count),
            StatementResult::Update { count } => write!(f, "{} row(s) updated.", count),
            StatementResult::Delete { count } => write!(f, "{} row(s) deleted.", count),
            StatementResult::Rows { columns, rows } => {
                write!(f, "{}", columns.join(" | "))?;
                for row in rows {
                    let fields: Vec<String> = row.iter().map(|v| v.to_string()).collect();
                    write!(f, "\n{}", fields.join(" | "))?;
                }
                Ok(())
            }
            StatementResult::Empty => Ok(()),
        }
    }
}
