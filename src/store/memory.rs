//! In-memory table store
//!
//! Holds each table as a list of batches and records every write so callers
//! can check the exact replace/append sequence. It cannot evaluate SQL: a
//! read query returns the canned result set with `with_query_result`.

use super::column_names;
use super::types::{Store, WriteMode};
use crate::error::{Error, Result};
use arrow::compute::concat_batches;
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// One successful `write_table` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRecord {
    pub table: String,
    pub rows: usize,
    pub mode: WriteMode,
}

#[derive(Debug)]
struct MemoryTable {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

/// Table store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: BTreeMap<String, MemoryTable>,
    writes: Vec<WriteRecord>,
    query_result: Option<RecordBatch>,
    queries: RefCell<Vec<String>>,
    /// Table name -> number of writes allowed before failing
    failing_tables: HashMap<String, usize>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `batch` from every read query
    #[must_use]
    pub fn with_query_result(mut self, batch: RecordBatch) -> Self {
        self.query_result = Some(batch);
        self
    }

    /// Fail every write to `table`
    #[must_use]
    pub fn fail_writes_to(self, table: impl Into<String>) -> Self {
        self.fail_writes_after(table, 0)
    }

    /// Let `successful` writes to `table` through, then fail the rest
    #[must_use]
    pub fn fail_writes_after(mut self, table: impl Into<String>, successful: usize) -> Self {
        self.failing_tables.insert(table.into(), successful);
        self
    }

    /// Full contents of `table` as one batch
    pub fn table(&self, name: &str) -> Option<RecordBatch> {
        let table = self.tables.get(name)?;
        concat_batches(&table.schema, &table.batches).ok()
    }

    /// Number of rows in `table`
    pub fn row_count(&self, name: &str) -> Option<usize> {
        self.tables
            .get(name)
            .map(|table| table.batches.iter().map(RecordBatch::num_rows).sum())
    }

    /// Names of all tables, sorted
    pub fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }

    /// Every successful write, in order
    pub fn writes(&self) -> &[WriteRecord] {
        &self.writes
    }

    /// Successful writes to one table, in order
    pub fn writes_to(&self, table: &str) -> Vec<&WriteRecord> {
        self.writes.iter().filter(|w| w.table == table).collect()
    }

    /// Every query passed to `execute_read_query`
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    fn check_injected_failure(&self, table: &str) -> Result<()> {
        if let Some(&allowed) = self.failing_tables.get(table) {
            if self.writes_to(table).len() >= allowed {
                return Err(Error::store(format!("injected write failure for '{table}'")));
            }
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn execute_read_query(&self, sql: &str) -> Result<RecordBatch> {
        self.queries.borrow_mut().push(sql.to_string());
        self.query_result
            .clone()
            .ok_or_else(|| Error::store("no query result configured for in-memory store"))
    }

    fn write_table(&mut self, table: &str, batch: &RecordBatch, mode: WriteMode) -> Result<usize> {
        self.check_injected_failure(table)?;

        match mode {
            WriteMode::Replace => {
                self.tables.insert(
                    table.to_string(),
                    MemoryTable {
                        schema: batch.schema(),
                        batches: vec![batch.clone()],
                    },
                );
            }
            WriteMode::Append => {
                let existing = self.tables.get_mut(table).ok_or_else(|| Error::TableNotFound {
                    table: table.to_string(),
                })?;

                let expected: Vec<String> = existing
                    .schema
                    .fields()
                    .iter()
                    .map(|f| f.name().clone())
                    .collect();
                let actual = column_names(batch);
                if expected != actual {
                    return Err(Error::SchemaMismatch {
                        table: table.to_string(),
                        expected: expected.join(", "),
                        actual: actual.join(", "),
                    });
                }

                // Keep the table's own schema so batches stay concatenable
                let aligned = RecordBatch::try_new(existing.schema.clone(), batch.columns().to_vec())?;
                existing.batches.push(aligned);
            }
        }

        self.writes.push(WriteRecord {
            table: table.to_string(),
            rows: batch.num_rows(),
            mode,
        });
        Ok(batch.num_rows())
    }
}
