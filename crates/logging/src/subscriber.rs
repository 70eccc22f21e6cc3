//! crates/logging/src/subscriber.rs
//! Subscriber installation for binaries.
//!
//! Verbosity maps onto an [`EnvFilter`] over the `rdelta` targets. An explicit
//! filter in [`LOG_ENV_VAR`] always wins over the command-line level.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Environment variable consulted for a full filter directive.
pub const LOG_ENV_VAR: &str = "RDELTA_LOG";

/// Returns the filter directive used for a `-v` count.
#[must_use]
pub fn filter_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "rdelta=warn",
        1 => "rdelta=info",
        2 => "rdelta=debug",
        _ => "rdelta=trace",
    }
}

/// Installs a formatted subscriber writing to standard error.
///
/// Returns `false` when a global subscriber was already installed, which
/// happens when several commands run inside one test process.
pub fn init(verbosity: u8) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(filter_for_verbosity(verbosity)));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}
