//! Table store
//!
//! The pipeline touches the relational store through two operations only:
//! a read query returning one Arrow `RecordBatch`, and a bulk table write
//! with replace or append semantics.
//!
//! - [`DuckDbStore`] runs against DuckDB, either a local database file or a
//!   PostgreSQL database attached through DuckDB's postgres extension.
//! - [`MemoryStore`] keeps tables in memory and records every write.

mod engine;
mod memory;
mod types;

pub use engine::DuckDbStore;
pub use memory::{MemoryStore, WriteRecord};
pub use types::{Store, WriteMode};

use arrow::record_batch::RecordBatch;

/// Column names of a batch, in order
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

/// Quote an identifier for use in SQL
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
