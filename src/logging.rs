//! Tracing subscriber setup for the CLI.
//!
//! The library only emits `tracing` events; installing a subscriber is left to
//! the binary. Events go to stderr so stdout stays clean for data URLs and
//! reports.

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter directive for the given settings.
///
/// `--verbose` forces `debug`; otherwise the configured level applies.
pub fn filter_directive(config: &LoggingConfig, verbose: bool) -> String {
    if verbose {
        "debug".to_string()
    } else {
        config.level.clone()
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the config when set.
///
/// Calling this twice is harmless: the second install is ignored.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let directive = filter_directive(config, verbose);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directive))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
