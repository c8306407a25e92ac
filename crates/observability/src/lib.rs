//! Shared logging setup for ledger services and tools.
//!
//! Every binary (and the integration-test harness) calls [`init`] once at
//! startup; library crates only emit `tracing` events and never install a
//! subscriber themselves.

use tracing_subscriber::EnvFilter;

/// Initialize process-wide structured logging.
///
/// JSON lines to stderr, filtered via `RUST_LOG` (default `info`). Safe to
/// call multiple times; only the first call installs the subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
