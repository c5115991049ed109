//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the API monitor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Application identity reported by diagnostics.
    pub app: AppInfoConfig,

    /// API log channel (dated files read by the analyzer).
    pub logging: LoggingConfig,

    /// Record store connection.
    pub database: DatabaseConfig,

    /// Blob store and public path layout.
    pub storage: StorageConfig,

    /// CORS policy applied to the router.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request size limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Application identity and runtime flags.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppInfoConfig {
    pub name: String,

    /// Deployment environment ("production", "local", ...).
    pub env: String,

    /// Debug mode. Exposes error details in API error bodies.
    pub debug: bool,

    /// Public base URL of the application.
    pub url: String,

    pub timezone: String,
}

impl Default for AppInfoConfig {
    fn default() -> Self {
        Self {
            name: "api-monitor".to_string(),
            env: "production".to_string(),
            debug: false,
            url: "http://localhost:8080".to_string(),
            timezone: "UTC".to_string(),
        }
    }
}

/// API log channel configuration.
///
/// Files are named `<file_prefix>-YYYY-MM-DD.<extension>` inside `directory`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Channel name written into every line (`[ts] <channel>.INFO: ...`).
    pub channel: String,

    /// Directory holding the dated log files.
    pub directory: String,

    pub file_prefix: String,

    pub extension: String,

    /// Case-insensitive marker the analyzer uses to pre-filter lines.
    pub marker: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            channel: "api".to_string(),
            directory: "storage/logs".to_string(),
            file_prefix: "api".to_string(),
            extension: "log".to_string(),
            marker: "api".to_string(),
        }
    }
}

/// Record store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (e.g., "sqlite:storage/database.sqlite").
    pub url: String,

    /// Table counted by the table-access probe.
    pub probe_table: String,

    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:storage/database.sqlite".to_string(),
            probe_table: "users".to_string(),
            max_connections: 5,
        }
    }
}

/// Storage layout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root of application storage.
    pub storage_path: String,

    /// Publicly served directory.
    pub public_path: String,

    /// Root of the public blob store.
    pub public_disk_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_path: "storage".to_string(),
            public_path: "public".to_string(),
            public_disk_path: "storage/app/public".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Path patterns the policy is advertised for.
    pub paths: Vec<String>,

    /// Allowed origins. `"*"` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods. `"*"` allows any method.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers. `"*"` allows any header.
    pub allowed_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            paths: vec!["api/*".to_string()],
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Largest request or response body buffered for logging, in bytes.
    /// Larger bodies are forwarded untouched and logged without fields.
    pub max_body_size: usize,

    /// Largest body handlers accept, in bytes. Also reported by diagnostics.
    pub max_upload_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

/// Driver, host and database name extracted from a connection URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionSummary {
    pub driver: String,
    pub host: Option<String>,
    pub database: Option<String>,
}

impl DatabaseConfig {
    /// Split the connection URL into the parts diagnostics report.
    ///
    /// Returns `None` when the URL does not parse.
    pub fn connection_summary(&self) -> Option<ConnectionSummary> {
        let parsed = url::Url::parse(&self.url).ok()?;
        let database = parsed.path().trim_start_matches('/');
        Some(ConnectionSummary {
            driver: parsed.scheme().to_string(),
            host: parsed.host_str().map(str::to_string),
            database: (!database.is_empty()).then(|| database.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("[app]\nenv = \"local\"\n").unwrap();
        assert_eq!(config.app.env, "local");
        assert_eq!(config.logging.file_prefix, "api");
        assert_eq!(config.database.probe_table, "users");
        assert_eq!(config.cors.paths, vec!["api/*".to_string()]);
    }

    #[test]
    fn sqlite_url_summary() {
        let db = DatabaseConfig::default();
        let summary = db.connection_summary().unwrap();
        assert_eq!(summary.driver, "sqlite");
        assert_eq!(summary.host, None);
        assert_eq!(summary.database.as_deref(), Some("storage/database.sqlite"));
    }

    #[test]
    fn networked_url_summary() {
        let db = DatabaseConfig {
            url: "postgres://db.internal:5432/marketplace".to_string(),
            ..Default::default()
        };
        let summary = db.connection_summary().unwrap();
        assert_eq!(summary.driver, "postgres");
        assert_eq!(summary.host.as_deref(), Some("db.internal"));
        assert_eq!(summary.database.as_deref(), Some("marketplace"));
    }
}
