//! Idempotent global tracing subscriber setup.
//!
//! Ground: teacher crates call `tracing::warn!`/`tracing::error!` freely and
//! assume a subscriber is installed by the embedding application; this gives
//! the same thing to callers of this crate (tests, the orchestrator entry
//! point) without requiring every caller to pull in `tracing-subscriber`
//! directly.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install a global `tracing` subscriber reading `RUST_LOG` (default `info`).
/// Safe to call multiple times; only the first call takes effect.
pub fn init() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init();
    });
}
