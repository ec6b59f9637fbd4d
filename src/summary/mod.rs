//! Vendor performance summary
//!
//! Extract, transform, load over the raw tables:
//!
//! 1. [`vendor_summary_sql`] aggregates purchases, sales and freight per
//!    (vendor, brand) group
//! 2. [`clean_data`] coerces types, fills gaps and derives the metrics
//! 3. The records replace the summary table, written in batches of
//!    `summary_batch_size` rows
//!
//! Any failure here is fatal for the run: it is logged and returned.

mod clean;
mod query;
mod types;

pub use clean::{clean_data, records_to_batch};
pub use query::vendor_summary_sql;
pub use types::{SummaryReport, VendorBrandRecord, QUERY_COLUMNS, SUMMARY_COLUMNS};

use crate::config::PipelineConfig;
use crate::error::{Result, ResultExt};
use crate::store::{Store, WriteMode};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use chrono::Utc;
use std::time::Instant;
use tracing::{debug, error, info};

/// Rows shown in debug samples
const SAMPLE_ROWS: usize = 5;

/// Builds the vendor summary table
pub struct Summarizer {
    config: PipelineConfig,
}

impl Summarizer {
    /// Create a summarizer for `config`, rejecting invalid settings
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Query, clean and persist the summary
    pub fn run<S: Store>(&self, store: &mut S) -> Result<SummaryReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        info!("===== Building vendor summary table =====");

        let rows = match self.build(store) {
            Ok(rows) => rows,
            Err(e) => {
                error!("Vendor summary failed: {e}");
                return Err(e);
            }
        };

        let report = SummaryReport {
            table: self.config.tables.summary.clone(),
            rows,
            started_at,
            elapsed: start.elapsed(),
        };
        info!(
            rows = report.rows,
            "Vendor summary table '{}' generation completed",
            report.table
        );
        info!("Total time taken: {:.2} minutes", report.elapsed_minutes());
        Ok(report)
    }

    fn build<S: Store>(&self, store: &mut S) -> Result<usize> {
        let raw = self.create_vendor_summary(store)?;
        log_sample("Raw summary sample", &raw);

        info!("Cleaning data and calculating performance metrics");
        let records = clean_data(&raw)?;
        info!("Data cleaning and feature engineering complete");

        info!(
            "Writing vendor summary to table '{}'",
            self.config.tables.summary
        );
        self.write_summary(store, &records)
    }

    /// Run the aggregation query over the raw tables
    pub fn create_vendor_summary<S: Store>(&self, store: &S) -> Result<RecordBatch> {
        info!("Running vendor summary query over purchases, sales, prices and freight");
        let sql = vendor_summary_sql(&self.config.tables);
        let batch = store
            .execute_read_query(&sql)
            .context("vendor summary query failed")?;
        info!(
            "Summary query returned {} vendor-brand combinations",
            batch.num_rows()
        );
        Ok(batch)
    }

    /// Replace the summary table with `records`
    ///
    /// The first batch replaces the table and later batches append. With no
    /// records the table is still replaced, empty, with every column.
    pub fn write_summary<S: Store>(
        &self,
        store: &mut S,
        records: &[VendorBrandRecord],
    ) -> Result<usize> {
        let table = &self.config.tables.summary;
        let batch = records_to_batch(records)?;
        log_sample("Cleaned summary sample", &batch);

        if batch.num_rows() == 0 {
            store.write_table(table, &batch, WriteMode::Replace)?;
            info!("Wrote 0 rows to '{table}' (replace)");
            return Ok(0);
        }

        let batch_size = self.config.summary_batch_size;
        let mut written = 0;
        let mut offset = 0;
        while offset < batch.num_rows() {
            let len = batch_size.min(batch.num_rows() - offset);
            let mode = if offset == 0 {
                WriteMode::Replace
            } else {
                WriteMode::Append
            };
            written += store.write_table(table, &batch.slice(offset, len), mode)?;
            offset += len;
        }

        info!("Wrote {written} rows to '{table}' (replace)");
        Ok(written)
    }
}

fn log_sample(label: &str, batch: &RecordBatch) {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return;
    }
    let sample = batch.slice(0, SAMPLE_ROWS.min(batch.num_rows()));
    match pretty_format_batches(&[sample]) {
        Ok(table) => debug!("{label}:\n{table}"),
        Err(e) => debug!("{label}: unavailable ({e})"),
    }
}
