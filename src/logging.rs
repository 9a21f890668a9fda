//! Subscriber setup for the `tracing` events emitted across the crate.

use tracing_subscriber::{fmt, EnvFilter};

/// Install a stderr subscriber. `RUST_LOG` wins over `default_level`.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .is_ok()
}
