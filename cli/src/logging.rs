//! # Structured Logging
//!
//! `tracing` subscriber setup for the `tranche` binary. Log output goes to
//! stderr so stdout stays clean for the JSON replay report.

use tracing_subscriber::EnvFilter;

/// Initialize the global tracing subscriber. Call once, early in `main()`.
///
/// `default_level` applies when `RUST_LOG` is not set (e.g. `"info"` or
/// `"tranche_engine=debug"`). `format` selects `"json"` lines for log
/// aggregation; anything else gets human-readable output.
pub fn init(default_level: &str, format: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    if format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
