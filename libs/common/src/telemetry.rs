//! Tracing subscriber setup shared by the service binaries

use tracing_subscriber::{EnvFilter, fmt};

/// Install the global subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // a subscriber may already be set when running under a test harness
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
