use std::collections::BTreeMap;

use crate::sql::types::DataType;

/// Abstract syntax tree node definitions for the five statement shapes
#[derive(Debug, PartialEq)]
pub enum Statement {
    CreateTable {
        name: String,
        columns: Vec<ColumnSpec>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Literal>,
    },
    Select {
        projection: Projection,
        table: String,
        join: Option<JoinClause>,
        predicate: Option<(String, Literal)>,
    },
    Update {
        table: String,
        /// Assignments keyed by column; a column assigned twice keeps the
        /// last literal
        assignments: BTreeMap<String, Literal>,
        predicate: Option<(String, Literal)>,
    },
    Delete {
        table: String,
        predicate: Option<(String, Literal)>,
    },
}

/// Column clause in a CREATE TABLE statement
#[derive(Debug, PartialEq)]
pub struct ColumnSpec {
    pub name: String,
    pub datatype: DataType,
    pub primary_key: bool,
    pub unique: bool,
}

/// Column list of a SELECT statement
#[derive(Debug, PartialEq)]
pub enum Projection {
    /// `SELECT *`
    All,
    Columns(Vec<String>),
}

/// `JOIN <table> ON <qualified> = <qualified>` clause
///
/// The qualifiers are carried as written but never checked against the
/// participating table names: the left column applies to the FROM table and
/// the right column to the joined table, whatever the qualifiers say.
#[derive(Debug, PartialEq)]
pub struct JoinClause {
    pub table: String,
    pub left: ColumnRef,
    pub right: ColumnRef,
}

/// A table-qualified column reference
#[derive(Debug, PartialEq)]
pub struct ColumnRef {
    pub table: String,
    pub column: String,
}

/// A literal as written in the statement, quotes already stripped but not
/// yet coerced against any column type
///
/// Coercion is column-driven: the executor decodes each literal exactly once
/// against the declared type of the column it lands in, so a quoted '42'
/// still becomes an integer in an INT column and a bare 42 becomes text in a
/// TEXT column.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Unquoted token
    Bare(String),
    /// Quoted token with one layer of quotes stripped
    Quoted(String),
}

impl Literal {
    /// The literal's text with any quoting already removed
    pub fn raw(&self) -> &str {
        match self {
            Literal::Bare(s) | Literal::Quoted(s) => s,
        }
    }
}
