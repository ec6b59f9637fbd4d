//! Store abstractions

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};

/// How a batch lands in its destination table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Drop the table and recreate it from the batch's columns
    Replace,
    /// Insert rows into an existing table with the same columns
    Append,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Replace => write!(f, "replace"),
            WriteMode::Append => write!(f, "append"),
        }
    }
}

/// Minimal capability interface over a relational store
pub trait Store {
    /// Run a read-only query and collect the result into one batch
    ///
    /// Column order in the batch follows the query's select list.
    fn execute_read_query(&self, sql: &str) -> Result<RecordBatch>;

    /// Write a batch into `table`, returning the number of rows written
    ///
    /// `Replace` always leaves a table with the batch's columns behind, even
    /// for an empty batch. `Append` fails when the table is missing or its
    /// columns differ from the batch.
    fn write_table(&mut self, table: &str, batch: &RecordBatch, mode: WriteMode) -> Result<usize>;
}
