//! Configuration file watcher for hot reload.
//!
//! Each change event reloads and validates the file, then diffs it against
//! the last applied configuration. Only files that change something are
//! forwarded. Sections bound at startup are reported as needing a restart.

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;

/// Sections consumed while building the listener, router and log channel.
pub const RESTART_REQUIRED: &[&str] = &["listener", "timeouts", "logging", "cors", "observability", "security"];

/// Names of the top-level sections that differ between `old` and `new`.
pub fn changed_sections(old: &AppConfig, new: &AppConfig) -> Vec<&'static str> {
    sections(old)
        .into_iter()
        .zip(sections(new))
        .filter(|((_, before), (_, after))| before != after)
        .map(|((name, _), _)| name)
        .collect()
}

fn sections(config: &AppConfig) -> [(&'static str, Value); 9] {
    [
        ("listener", section(&config.listener)),
        ("timeouts", section(&config.timeouts)),
        ("app", section(&config.app)),
        ("logging", section(&config.logging)),
        ("database", section(&config.database)),
        ("storage", section(&config.storage)),
        ("cors", section(&config.cors)),
        ("observability", section(&config.observability)),
        ("security", section(&config.security)),
    ]
}

fn section<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Last applied configuration and the file it came from.
struct Reloader {
    path: PathBuf,
    current: AppConfig,
}

impl Reloader {
    /// The new configuration when the file is valid and changes something.
    fn reload(&mut self) -> Option<AppConfig> {
        let next = match load_config(&self.path) {
            Ok(next) => next,
            Err(e) => {
                tracing::error!(error = %e, "Failed to reload config, keeping current configuration");
                return None;
            }
        };

        let changed = changed_sections(&self.current, &next);
        if changed.is_empty() {
            tracing::debug!(path = ?self.path, "Config file touched without changes");
            return None;
        }

        let restart: Vec<&str> = changed
            .iter()
            .copied()
            .filter(|name| RESTART_REQUIRED.contains(name))
            .collect();
        tracing::info!(sections = ?changed, "Config sections changed");
        if !restart.is_empty() {
            tracing::warn!(sections = ?restart, "Changes to these sections apply after a restart");
        }

        self.current = next.clone();
        Some(next)
    }
}

/// Watches the configuration file and forwards effective changes.
pub struct ConfigWatcher {
    reloader: Reloader,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// `current` is the configuration the server started with.
    pub fn new(path: &Path, current: AppConfig) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let reloader = Reloader {
            path: path.to_path_buf(),
            current,
        };
        (Self { reloader, update_tx }, update_rx)
    }

    /// Start watching the file. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            mut reloader,
            update_tx,
        } = self;
        let path = reloader.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    if let Some(next) = reloader.reload() {
                        let _ = update_tx.send(next);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Config watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?path, "Config watcher started");
        Ok(watcher)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_names_changed_sections() {
        let old = AppConfig::default();
        let mut new = old.clone();
        assert!(changed_sections(&old, &new).is_empty());

        new.app.env = "staging".into();
        new.cors.allowed_origins = vec!["https://app.example.com".into()];
        assert_eq!(changed_sections(&old, &new), vec!["app", "cors"]);
    }

    #[test]
    fn reload_skips_unchanged_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[app]\nenv = \"staging\"\n").unwrap();

        let mut reloader = Reloader {
            path: path.clone(),
            current: AppConfig::default(),
        };
        let applied = reloader.reload().expect("changed env is forwarded");
        assert_eq!(applied.app.env, "staging");

        // Editors often emit several events for one save.
        assert!(reloader.reload().is_none());

        std::fs::write(&path, "[app\n").unwrap();
        assert!(reloader.reload().is_none());
        assert_eq!(reloader.current.app.env, "staging");
    }
}
