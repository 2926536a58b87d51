//! Tracing subscriber setup
//!
//! The engine emits `tracing` events (batch-drop warnings, component
//! realization debug lines) but never installs a subscriber on its
//! own. Host applications call [`init`] once at startup; tests and
//! embedders that bring their own subscriber skip it.

use tracing_subscriber::EnvFilter;

/// Install a global compact-format subscriber.
///
/// `default_filter` is used when `RUST_LOG` is not set, e.g.
/// `"sparview_core=info"`. Returns an error when a subscriber is
/// already installed.
pub fn init(default_filter: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {}", e))
}
