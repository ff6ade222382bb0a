//! # CLI Interface
//!
//! Command-line argument structure for the `tranche` binary, via `clap`
//! derive. Three subcommands: `replay`, `check`, and `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tranche vesting-engine replay driver.
///
/// Applies a scenario file — seeded balances plus a time-ordered list of
/// engine operations — to a fresh vesting engine and reports the resulting
/// event log and wallet summaries. Replays are fully deterministic: logical
/// times come from the scenario, never from the wall clock.
#[derive(Parser, Debug)]
#[command(
    name = "tranche",
    about = "Tranche vesting-engine scenario replay",
    version,
    propagate_version = true
)]
pub struct TrancheCli {
    /// Default log level when `RUST_LOG` is not set.
    #[arg(long, env = "TRANCHE_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "TRANCHE_LOG_FORMAT", default_value = "pretty", global = true)]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `tranche` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply a scenario file to a fresh engine and print the replay report.
    Replay(ReplayArgs),
    /// Parse and validate a scenario file without applying it.
    Check(CheckArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `replay` subcommand.
#[derive(Parser, Debug)]
pub struct ReplayArgs {
    /// Path to the scenario file (JSON).
    pub scenario: PathBuf,

    /// Logical time at which wallet summaries are computed.
    ///
    /// Defaults to the `at` of the scenario's last step.
    #[arg(long)]
    pub report_at: Option<u64>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pub pretty: bool,
}

/// Arguments for the `check` subcommand.
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to the scenario file (JSON).
    pub scenario: PathBuf,
}
