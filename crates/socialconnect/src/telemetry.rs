//! Log output for binaries built on the client.
//!
//! Libraries in this workspace only emit `tracing` events. Installing a
//! subscriber is left to the binary, which calls [`init`] once at startup.

use tracing_subscriber::EnvFilter;

/// Installs a formatting subscriber filtered by `RUST_LOG`, or by
/// `default_directive` (e.g. `"info"` or `"socialconnect=debug"`) when
/// `RUST_LOG` is unset or invalid.
///
/// Does nothing if a global subscriber is already set.
pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
