//! CLI module
//!
//! Shared command-line front end for the two pipeline binaries.
//!
//! # Binaries
//!
//! - `vendor-ingest run` - load source CSV files into raw tables
//! - `vendor-summary run` - build the vendor summary table
//!
//! `run` is the default when no subcommand is given.

mod commands;
mod logging;
mod runner;

pub use commands::{Cli, Commands, Component};
pub use logging::init_logging;
pub use runner::Runner;
