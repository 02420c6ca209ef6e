//! Logging bootstrap.
//!
//! The crate itself logs through `log` macros and `tracing` spans; hosts
//! call this once at startup to wire both into one subscriber.

use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber and the `log` bridge. Honors `RUST_LOG`
/// when set, falls back to `default_filter` otherwise. Calling it more
/// than once is harmless.
pub fn init_logging(default_filter: &str) {
    let _ = LogTracer::init();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
