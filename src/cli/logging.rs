//! Tracing subscriber setup for the binaries

use super::commands::Component;
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Install the global subscriber
///
/// Events go to stderr and, when `log_dir` is set, are appended without
/// ANSI colors to the component's log file there.
pub fn init_logging(log_dir: Option<&Path>, component: Component, verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = || EnvFilter::from_default_env().add_directive(level.into());

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    let file = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let path = dir.join(component.log_file_name());
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file)
        .try_init()
        .map_err(|e| Error::config(format!("Failed to initialize logging: {e}")))
}
