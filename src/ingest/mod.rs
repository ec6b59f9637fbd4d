//! CSV ingestion
//!
//! Loads every CSV in the source directory into its own raw table.
//!
//! # Overview
//!
//! - Each file maps to a table named by [`table_identifier`](crate::naming::table_identifier)
//! - Files stream through [`CsvChunkReader`] in chunks of `chunk_size` rows
//! - The first chunk replaces the table, later chunks append to it
//! - A failing file is logged and skipped; the run carries on with the next

mod discovery;
mod reader;
mod types;

pub use discovery::{list_source_files, SourceFile, CSV_SUFFIX};
pub use reader::{normalize_schema, CsvChunkReader, CsvOptions, MISSING_VALUE_PATTERN};
pub use types::{FileOutcome, FileStatus, IngestReport, IngestStatus, LoadStats};

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::store::{Store, WriteMode};
use arrow::record_batch::RecordBatch;
use chrono::Utc;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info, warn};

/// Loads source CSV files into raw tables
pub struct Ingestor {
    config: PipelineConfig,
}

impl Ingestor {
    /// Create an ingestor for `config`, rejecting invalid settings
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// CSV options derived from the config
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            chunk_size: self.config.chunk_size,
            delimiter: self.config.delimiter as u8,
            infer_schema_rows: self.config.infer_schema_rows,
        }
    }

    /// Ingest every CSV file in the source directory
    ///
    /// A missing or empty source directory is not an error: the report says
    /// why nothing ran. Per-file failures are recorded in the report. Only
    /// an unreadable source directory returns `Err`.
    pub fn run<S: Store>(&self, store: &mut S) -> Result<IngestReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        let source_dir = &self.config.source_dir;

        let files = match list_source_files(source_dir) {
            Ok(files) => files,
            Err(e) if e.is_nothing_to_do() => {
                error!("Data folder not found: {}", source_dir.display());
                return Ok(IngestReport::nothing_to_do(
                    IngestStatus::SourceDirMissing {
                        path: source_dir.display().to_string(),
                    },
                    started_at,
                ));
            }
            Err(e) => {
                error!("Failed to list {}: {e}", source_dir.display());
                return Err(e);
            }
        };

        if files.is_empty() {
            warn!("No CSV files found in '{}'", source_dir.display());
            return Ok(IngestReport::nothing_to_do(
                IngestStatus::NoSourceFiles {
                    path: source_dir.display().to_string(),
                },
                started_at,
            ));
        }

        let mut outcomes = Vec::with_capacity(files.len());
        for file in files {
            info!("Ingesting {} -> table '{}' (chunked)", file.name, file.table);

            let status = match self.ingest_file(store, &file.path, &file.table) {
                Ok(stats) => {
                    info!(
                        rows = stats.rows,
                        chunks = stats.chunks,
                        "Ingested {} rows into '{}' from {}",
                        stats.rows,
                        file.table,
                        file.name
                    );
                    FileStatus::Loaded(stats)
                }
                Err(e) => {
                    error!(
                        "Failed ingest for {} -> {}: {e}",
                        file.path.display(),
                        file.table
                    );
                    FileStatus::Failed {
                        error: e.to_string(),
                    }
                }
            };
            outcomes.push(FileOutcome { file, status });
        }

        let report = IngestReport {
            status: IngestStatus::Completed,
            files: outcomes,
            started_at,
            elapsed: start.elapsed(),
        };

        info!(
            loaded = report.loaded().count(),
            failed = report.failed().count(),
            "-- Ingestion complete --"
        );
        info!("Total time taken: {:.2} minutes", report.elapsed_minutes());
        Ok(report)
    }

    /// Stream one CSV file into `table`
    ///
    /// Chunks written before a failure stay in the table.
    pub fn ingest_file<S: Store>(&self, store: &mut S, path: &Path, table: &str) -> Result<LoadStats> {
        let mut reader = CsvChunkReader::open(path, &self.csv_options())?;
        let mut stats = LoadStats::default();

        while let Some(chunk) = reader.next_chunk()? {
            let mode = next_mode(&stats);
            stats.rows += store.write_table(table, &chunk, mode)?;
            stats.chunks += 1;
        }

        // Header-only file: still materialize the (empty) table
        if stats.chunks == 0 {
            let empty = RecordBatch::new_empty(reader.schema());
            store.write_table(table, &empty, WriteMode::Replace)?;
        }

        Ok(stats)
    }
}

/// The first chunk of a load replaces, every later one appends
fn next_mode(stats: &LoadStats) -> WriteMode {
    if stats.chunks == 0 {
        WriteMode::Replace
    } else {
        WriteMode::Append
    }
}
