//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Install a JSON formatter with an env-driven filter.
///
/// `default_directive` applies when `RUST_LOG` is unset or invalid
/// (e.g. `"info"` or `"foodbank_stock=debug,info"`). Returns `false` when a
/// global subscriber was already installed.
pub fn init_with_default(default_directive: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_current_span(false)
        .try_init()
        .is_ok()
}
