//! Structured logging.
//!
//! Every binary initializes the same subscriber: an `EnvFilter` (taken from
//! `RUST_LOG` when set) feeding the fmt layer.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the server binary at the given crate log level.
pub fn default_filter(level: &str) -> String {
    format!("api_monitor={level},tower_http={level}")
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `fallback`. Calling this twice is a no-op.
pub fn init_tracing(fallback: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback.into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
