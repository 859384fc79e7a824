pub mod engine;
pub mod file;
pub mod memory;
