//! Statement processing module
//!
//! This module provides:
//! - `parser`: statement lexer and parser
//! - `types`: data types and row values
//! - `schema`: column definitions
//! - `table`: per-table row storage, indexes, persistence
//! - `catalog`: the table registry
//! - `engine`: statement execution over the catalog

pub mod catalog;
pub mod engine;
pub mod parser;
pub mod schema;
pub mod table;
pub mod types;
