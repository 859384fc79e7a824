use std::sync::PoisonError;

use thiserror::Error;

use crate::sql::types::{DataType, Value};

/// Custom Result type for graindb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for graindb
#[derive(Debug, Error)]
pub enum Error {
    /// Statement text matches none of the recognized shapes
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Referenced table does not exist
    #[error("table {0} does not exist")]
    TableNotFound(String),

    /// Referenced column is not declared on the table
    #[error("column {column} does not exist in table {table}")]
    ColumnNotFound { table: String, column: String },

    /// Insert/update value collides with an existing primary-key/unique entry
    #[error("duplicate value for unique column {column}: {value}")]
    ConstraintViolation { column: String, value: Value },

    /// Literal cannot be coerced to the column's declared type
    #[error("cannot coerce {value:?} to {datatype} for column {column}")]
    TypeMismatch {
        column: String,
        value: String,
        datatype: DataType,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Storage-layer failure (lock poisoning, invalid documents)
    #[error("storage error: {0}")]
    Storage(String),
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Storage(value.to_string())
    }
}
