//! Logging setup.
//!
//! Events go to stderr so that exported data on stdout stays parseable.

use tracing_subscriber::EnvFilter;

use crate::config::DEFAULT_LOG_LEVEL;

/// Pick the filter directive used when `RUST_LOG` is not set.
///
/// `-v` and `-q` override the configured level.
pub fn filter_directive(verbose: bool, quiet: bool, configured: Option<&str>) -> String {
    if verbose {
        "debug".to_string()
    } else if quiet {
        "warn".to_string()
    } else {
        configured
            .filter(|level| !level.trim().is_empty())
            .unwrap_or(DEFAULT_LOG_LEVEL)
            .to_string()
    }
}

/// Install the global subscriber. `RUST_LOG` takes precedence over `directive`.
pub fn init(directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(directive))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
