//! Command-line interface: `run` the detector in the foreground, print a
//! `status` snapshot, or `check` that configuration and venues are reachable.

pub mod check;
pub mod output;
pub mod run;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "arbitrex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "arbitrex.toml", global = true)]
    pub config: PathBuf,

    /// Emit JSON-formatted logs instead of the default pretty format.
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion/matching/detection loops in the foreground.
    Run,
    /// Print the current status/health snapshot as JSON.
    Status,
    /// Validate configuration and probe venue reachability.
    Check,
}
