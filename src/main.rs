//! # journeysim - entry point
//!
//! Parses the command line, initialises tracing and dispatches to the
//! command handlers.
//!
//! ## Logging
//!
//! Logs go to stderr so that `run --stdout` can stream the report bundle on
//! stdout. `--log-level` takes precedence over `RUST_LOG`; without either
//! the filter is `info`.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use journeysim::cli::Cli;
use journeysim::commands::execute_command;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_deref());

    let result = execute_command(cli.command).await;
    debug!("Finished in {:?}", start_time.elapsed());
    result
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing(level: Option<&str>) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
