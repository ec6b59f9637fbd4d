//! vendor-ingest
//!
//! Loads every CSV in the source directory into its own table

use vendor_etl::cli::{Cli, Component, Runner};

fn main() {
    let cli = Cli::parse_for(Component::Ingest);
    let runner = Runner::new(Component::Ingest, cli);

    if let Err(e) = runner.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
