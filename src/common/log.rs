//! Subscriber setup for the `tracing` events emitted by the bridge.
//!
//! The host process may already own a global subscriber (a Flutter embedder or
//! a test harness), so installation is best effort and happens at most once.

use once_cell::sync::OnceCell;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::config::BridgeCfg;

static INSTALLED: OnceCell<bool> = OnceCell::new();

/// Install the global subscriber described by `cfg`.
///
/// Returns `true` when this call (or an earlier one) installed our subscriber,
/// `false` when another subscriber was already in place.
pub fn init(cfg: &BridgeCfg) -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_new(&cfg.log_filter)
            .unwrap_or_else(|_| EnvFilter::new(super::config::DEFAULT_LOG_FILTER));

        let registry = tracing_subscriber::registry().with(filter);
        let result = if cfg.log_json {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_thread_names(true)
                        .json(),
                )
                .try_init()
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_thread_names(true)
                        .compact(),
                )
                .try_init()
        };

        result.is_ok()
    })
}
