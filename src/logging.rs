//! Tracing initialisation for the command line.
//!
//! All log output goes to stderr; stdout carries only the JSON report.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "feed_digest=info,digest_search=info";

/// `RUST_LOG` if it parses, [`DEFAULT_FILTER`] otherwise. `verbose` raises
/// both crates to debug.
pub fn env_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("feed_digest=debug,digest_search=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. Later calls are ignored.
pub fn init(verbose: bool) {
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter(verbose))
        .try_init();
}
