//! vendor-summary
//!
//! Builds the vendor performance summary table from the raw tables

use vendor_etl::cli::{Cli, Component, Runner};

fn main() {
    let cli = Cli::parse_for(Component::Summary);
    let runner = Runner::new(Component::Summary, cli);

    if let Err(e) = runner.run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
