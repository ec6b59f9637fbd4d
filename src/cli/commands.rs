//! CLI commands and argument parsing

use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;

/// Vendor ETL pipeline stage
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON), overrides VENDOR_ETL_CONFIG
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// CLI subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the stage (default)
    Run,
}

/// Which pipeline stage a binary runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Load source CSV files into raw tables
    Ingest,
    /// Build the vendor summary table
    Summary,
}

impl Component {
    /// Executable name
    pub fn binary_name(self) -> &'static str {
        match self {
            Component::Ingest => "vendor-ingest",
            Component::Summary => "vendor-summary",
        }
    }

    /// Log file name under the configured log directory
    pub fn log_file_name(self) -> &'static str {
        match self {
            Component::Ingest => "ingestion.log",
            Component::Summary => "vendor_summary.log",
        }
    }

    fn about(self) -> &'static str {
        match self {
            Component::Ingest => "Load every CSV in the source directory into its own table",
            Component::Summary => "Build the vendor performance summary table",
        }
    }
}

impl Cli {
    /// Parse process arguments for `component`'s binary
    pub fn parse_for(component: Component) -> Self {
        Self::parse_from_for(component, std::env::args_os())
    }

    /// Parse `args` for `component`'s binary, exiting on usage errors
    pub fn parse_from_for<I, T>(component: Component, args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = <Self as CommandFactory>::command()
            .name(component.binary_name())
            .about(component.about())
            .get_matches_from(args);
        Self::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
    }

    /// Subcommand to run, `run` when none was given
    pub fn subcommand(&self) -> Commands {
        self.command.unwrap_or(Commands::Run)
    }
}
