//! Shared tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// `default_filter` is the `RUST_LOG` value used when the env-var is not set
/// (e.g. `"opal_install=info"`).
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}
