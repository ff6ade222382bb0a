// Copyright (c) 2026 Tranche Labs. MIT License.
// See LICENSE for details.

//! # Tranche Replay Driver
//!
//! Entry point for the `tranche` binary. Parses CLI arguments, initializes
//! logging, and replays vesting scenarios against a fresh engine.
//!
//! The binary supports three subcommands:
//!
//! - `replay`  — apply a scenario file and print the replay report
//! - `check`   — parse and validate a scenario file without applying it
//! - `version` — print build version information

mod cli;
mod logging;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;

use cli::{CheckArgs, Commands, ReplayArgs, TrancheCli};
use scenario::Scenario;
use tranche_engine::config::{ENGINE_VERSION, SCENARIO_FORMAT_VERSION};

fn main() -> Result<()> {
    let cli = TrancheCli::parse();
    logging::init(&cli.log_level, &cli.log_format);

    match cli.command {
        Commands::Replay(args) => replay(args),
        Commands::Check(args) => check(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Applies a scenario and prints the report as JSON on stdout.
fn replay(args: ReplayArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    tracing::info!(
        path = %args.scenario.display(),
        steps = scenario.steps.len(),
        "replaying scenario"
    );

    let report = scenario.run(args.report_at)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .context("failed to serialize replay report")?;
    println!("{json}");
    Ok(())
}

/// Validates a scenario file without applying it.
fn check(args: CheckArgs) -> Result<()> {
    let scenario = load_scenario(&args.scenario)?;
    println!(
        "ok: {} steps, {} seeded balances, owner {}",
        scenario.steps.len(),
        scenario.balances.len(),
        scenario.owner
    );
    Ok(())
}

fn load_scenario(path: &std::path::Path) -> Result<Scenario> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
    Scenario::from_json(&text)
        .with_context(|| format!("invalid scenario file: {}", path.display()))
}

fn print_version() {
    println!("tranche {}", env!("CARGO_PKG_VERSION"));
    println!("engine version: {ENGINE_VERSION}");
    println!("scenario format: {SCENARIO_FORMAT_VERSION}");
}
