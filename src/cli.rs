//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// journeysim - concurrent customer-journey simulator
#[derive(Parser, Debug)]
#[command(name = "journeysim")]
#[command(version)]
#[command(about = "Simulate customer journeys through finite-state business workflows")]
#[command(
    long_about = "journeysim runs thousands of concurrent customer journeys per experiment configuration (workflow variant, company strategy, disobedience probability) and reports where they end up."
)]
pub struct Cli {
    /// Log filter used when RUST_LOG is not set (e.g. info, debug, journeysim_orchestrator=trace)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run every configuration of a run file
    Run(RunArgs),

    /// Load and validate a run file without simulating
    Validate {
        /// Run configuration (TOML)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// List the strategy names a catalog defines
    Strategies {
        /// Catalog file (JSON)
        #[arg(long)]
        catalog: PathBuf,
    },
}

/// Arguments of `journeysim run`. Flags override values from the file.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Run configuration (TOML)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Customers per configuration
    #[arg(long)]
    pub customers: Option<u64>,

    /// Seed for the shared random source
    #[arg(long)]
    pub seed: Option<u64>,

    /// Catalog file (JSON)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Directory to write one CSV per configuration plus summary.csv
    #[arg(long, conflicts_with = "stdout")]
    pub out: Option<PathBuf>,

    /// Write all reports to stdout as one bundle
    #[arg(long, default_value_t = false)]
    pub stdout: bool,

    /// Serve the live query API on this address while the run is in progress
    #[arg(long)]
    pub serve: Option<SocketAddr>,
}
