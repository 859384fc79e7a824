use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Supported SQL data types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Text,
}

impl Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            DataType::Integer => "INT",
            DataType::Text => "TEXT",
        })
    }
}

/// Runtime value type for row fields
///
/// Untagged so that a persisted row document reads `[1,"Alice"]` rather than
/// a map of variant names. No floating-point variant exists, so values are
/// hashable and can key a uniqueness index directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Missing marker for columns an insert left unspecified
    Null,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
        }
    }
}

/// A row is a vector of values, positionally aligned with the table's
/// declared column order
pub type Row = Vec<Value>;
