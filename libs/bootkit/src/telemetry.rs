//! Logging initialization for hosts.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` fmt subscriber filtered by `RUST_LOG`.
///
/// Idempotent: a second call (or a subscriber installed by the host first)
/// is a no-op. Hosts call this before `bootstrap::run`; the library itself
/// only ever emits through `tracing` and never installs anything.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();
}
