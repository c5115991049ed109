//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → shared via Arc<ArcSwap<AppConfig>> with the server
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → watcher.rs diffs sections, drops no-op reloads
//!     → server swaps the shared snapshot
//!     → diagnostics observe the new values
//! ```
//!
//! # Design Decisions
//! - Every field has a default so a missing file or minimal file works
//! - Listener, CORS and log channel are fixed at startup; reload only
//!   affects values read per request (diagnostics snapshots)

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::{
    AppConfig, AppInfoConfig, CorsConfig, DatabaseConfig, ListenerConfig, LoggingConfig,
    ObservabilityConfig, SecurityConfig, StorageConfig, TimeoutConfig,
};
pub use watcher::{changed_sections, ConfigWatcher};

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Configuration snapshot shared with request handlers. Readers call
/// `load()`; the reload task calls `store()`.
pub type SharedConfig = Arc<ArcSwap<AppConfig>>;

pub fn shared(config: AppConfig) -> SharedConfig {
    Arc::new(ArcSwap::from_pointee(config))
}
