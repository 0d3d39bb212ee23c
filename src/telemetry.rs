//! Logging setup.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::ComposeConfig;

/// Build the filter: `RUST_LOG` first, then the configured directive,
/// then `info`.
pub fn env_filter(config: &ComposeConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        config
            .log_filter
            .as_deref()
            .and_then(|directive| EnvFilter::try_new(directive).ok())
            .unwrap_or_else(|| EnvFilter::new("info"))
    })
}

/// Install a global fmt subscriber. Returns `false` when one was already
/// installed, which makes repeated calls harmless.
pub fn init_logging(config: &ComposeConfig) -> bool {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(env_filter(config))
        .try_init()
        .is_ok()
}
