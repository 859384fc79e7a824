use serde::{Deserialize, Serialize};

use crate::sql::types::DataType;

/// Column schema definition
///
/// The set of column definitions for a table is what the catalog persists in
/// the schema document. At most one primary key per table is assumed but not
/// enforced; every primary-key or unique column carries a uniqueness index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub datatype: DataType,
    pub primary_key: bool,
    pub unique: bool,
}

impl Column {
    /// Whether this column maintains a uniqueness index
    pub fn indexed(&self) -> bool {
        self.primary_key || self.unique
    }
}
