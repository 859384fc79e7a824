//! GrainDB - an embedded, file-backed relational data store
//!
//! This crate provides a minimal statement-driven database with:
//! - statement parsing (lexer, parser, AST)
//! - schema and uniqueness constraint enforcement
//! - per-table JSON document persistence
//! - a two-table nested-loop equality join
//!
//! The single entry point is [Database::execute]: feed it one statement
//! string, get back rows, a status, or an error.
//!
//! ```no_run
//! use graindb::{Database, FileStorage};
//!
//! fn main() -> graindb::Result<()> {
//!     let mut db = Database::open(FileStorage::new("data")?)?;
//!     db.execute("CREATE TABLE users (id INT PRIMARY KEY, name TEXT UNIQUE)")?;
//!     db.execute("INSERT INTO users (id, name) VALUES (1, 'Alice')")?;
//!     let result = db.execute("SELECT * FROM users WHERE id = 1")?;
//!     println!("{}", result);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sql;
pub mod storage;

pub use error::{Error, Result};
pub use sql::engine::{Database, StatementResult};
pub use storage::{file::FileStorage, memory::MemoryStorage};
