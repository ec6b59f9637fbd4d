// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # Vendor ETL
//!
//! Two-stage batch pipeline for vendor performance analysis.
//!
//! ## Stages
//!
//! - **Ingestion**: every CSV in a source directory is streamed in chunks
//!   into its own raw table, named after the file
//! - **Summary**: one aggregation query joins purchases, the price list,
//!   sales and freight per (vendor, brand); the result is cleaned, enriched
//!   with profitability metrics and written to the summary table
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use vendor_etl::config::PipelineConfig;
//! use vendor_etl::ingest::Ingestor;
//! use vendor_etl::store::DuckDbStore;
//! use vendor_etl::summary::Summarizer;
//!
//! fn main() -> vendor_etl::Result<()> {
//!     let config = PipelineConfig::from_env()?;
//!     let mut store = DuckDbStore::open(&config.store)?;
//!
//!     let report = Ingestor::new(config.clone())?.run(&mut store)?;
//!     println!("{} rows ingested", report.total_rows());
//!
//!     Summarizer::new(config)?.run(&mut store)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   chunks    ┌─────────────────┐
//! │  data/*.csv  │ ──────────► │   raw tables    │
//! └──────────────┘  (ingest)   └────────┬────────┘
//!                                       │ aggregation query
//!                              ┌────────▼────────┐
//!                              │ clean + derive  │
//!                              └────────┬────────┘
//!                                       │ batched replace
//!                              ┌────────▼────────┐
//!                              │  summary table  │
//!                              └─────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the pipeline
pub mod error;

/// Pipeline configuration
pub mod config;

/// Table and column identifier normalization
pub mod naming;

/// Relational store abstraction (DuckDB, in-memory)
pub mod store;

/// Chunked CSV ingestion
pub mod ingest;

/// Vendor summary aggregation, cleaning and persistence
pub mod summary;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
