//! Tracing subscriber setup for test binaries.

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, honoring `RUST_LOG`.
///
/// Safe to call from every test; later calls are no-ops.
pub fn init() {
    init_with_default_filter("info");
}

/// Install the global subscriber with an explicit fallback filter
pub fn init_with_default_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
