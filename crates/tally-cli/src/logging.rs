//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only replies.

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "warn";

/// Install the global subscriber. `RUST_LOG` wins over the configured filter;
/// `verbose` forces debug output for the tally crates.
pub fn init(configured: Option<&str>, verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("tally_core=debug,tally=debug")
    } else {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(configured.unwrap_or(DEFAULT_FILTER)))
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    // fails only if a subscriber is already installed
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
