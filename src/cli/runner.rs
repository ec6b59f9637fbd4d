//! CLI runner - executes a pipeline stage

use super::commands::{Cli, Commands, Component};
use super::logging::init_logging;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::ingest::{FileStatus, IngestReport, IngestStatus, Ingestor};
use crate::store::DuckDbStore;
use crate::summary::Summarizer;

/// CLI runner
pub struct Runner {
    component: Component,
    cli: Cli,
}

impl Runner {
    /// Create a runner for one binary
    pub fn new(component: Component, cli: Cli) -> Self {
        Self { component, cli }
    }

    /// Load config, set up logging and run the stage
    pub fn run(&self) -> Result<()> {
        let config = PipelineConfig::resolve(self.cli.config.as_deref())?;
        init_logging(config.log_dir.as_deref(), self.component, self.cli.verbose)?;

        match (self.cli.subcommand(), self.component) {
            (Commands::Run, Component::Ingest) => Self::ingest(config),
            (Commands::Run, Component::Summary) => Self::summarize(config),
        }
    }

    fn ingest(config: PipelineConfig) -> Result<()> {
        let mut store = DuckDbStore::open(&config.store)?;
        let report = Ingestor::new(config)?.run(&mut store)?;
        print_ingest_report(&report);
        Ok(())
    }

    fn summarize(config: PipelineConfig) -> Result<()> {
        let mut store = DuckDbStore::open(&config.store)?;
        match Summarizer::new(config)?.run(&mut store) {
            Ok(report) => {
                println!(
                    "✓ Vendor summary table '{}' created ({} rows, {:.2} min)",
                    report.table,
                    report.rows,
                    report.elapsed_minutes()
                );
                Ok(())
            }
            Err(e) => {
                println!("✗ Vendor summary failed: {e}");
                Err(e)
            }
        }
    }
}

fn print_ingest_report(report: &IngestReport) {
    match &report.status {
        IngestStatus::SourceDirMissing { path } => {
            println!("Data folder not found: {path}");
            return;
        }
        IngestStatus::NoSourceFiles { path } => {
            println!("No CSV files found in '{path}'");
            return;
        }
        IngestStatus::Completed => {}
    }

    for outcome in &report.files {
        match &outcome.status {
            FileStatus::Loaded(stats) => println!(
                "✓ {} → {} ({} rows)",
                outcome.file.name, outcome.file.table, stats.rows
            ),
            FileStatus::Failed { error } => println!(
                "✗ {} → {}: {error}",
                outcome.file.name, outcome.file.table
            ),
        }
    }
    println!(
        "Ingestion complete: {} loaded, {} failed, {} rows in {:.2} min",
        report.loaded().count(),
        report.failed().count(),
        report.total_rows(),
        report.elapsed_minutes()
    );
}
