//! Diagnostics probes.
//!
//! Five independent checks, each run in isolation: a probe that panics is
//! reported as `{success: false, error}` and the remaining probes still run.

use chrono::Utc;
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

use crate::config::schema::ConnectionSummary;
use crate::config::{AppConfig, CorsConfig, SharedConfig};
use crate::diagnostics::blob::BlobStore;
use crate::diagnostics::store::RecordStore;
use crate::http::request::RequestMeta;
use crate::observability::channel::TIMESTAMP_FORMAT;
use crate::observability::metrics;

/// Table error reported when the connectivity probe already failed.
pub const DATABASE_CONNECTION_FAILED: &str = "Database connection failed";

/// Blob-store prefix for storage probe files.
pub const STORAGE_TEST_PREFIX: &str = "diagnostics";

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub app_name: String,
    pub app_version: &'static str,
    pub server_software: String,
    pub server_protocol: String,
    pub request_time: i64,
    pub os: &'static str,
    pub arch: &'static str,
    pub pid: u32,
    pub max_upload_size: usize,
    pub max_post_size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestInfo {
    pub ip: String,
    pub user_agent: Option<String>,
    pub method: String,
    pub url: String,
    pub path: String,
    pub content_type: Option<String>,
    pub accept: Option<String>,
    /// `"Present"` or `"Missing"`; the value itself is never echoed.
    pub authorization: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseCheck {
    pub connection_successful: bool,
    pub connection_error: Option<String>,
    pub config: ConnectionSummary,
    pub table_access: bool,
    pub table_error: Option<String>,
    pub user_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StorageCheck {
    pub public_disk_writable: bool,
    pub public_disk_error: Option<String>,
    pub storage_path: String,
    pub public_path: String,
    pub public_disk_path: String,
    pub symbolic_link_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvironmentInfo {
    pub app_env: String,
    pub app_debug: bool,
    pub app_url: String,
    pub timezone: String,
    pub cors: CorsConfig,
    pub logging_channel: String,
}

/// Shape reported for a probe that did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeFailure {
    pub success: bool,
    pub error: String,
}

impl ProbeFailure {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ProbeOutcome<T> {
    Completed(T),
    Failed(ProbeFailure),
}

impl<T> ProbeOutcome<T> {
    pub fn completed(&self) -> Option<&T> {
        match self {
            ProbeOutcome::Completed(value) => Some(value),
            ProbeOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&ProbeFailure> {
        match self {
            ProbeOutcome::Completed(_) => None,
            ProbeOutcome::Failed(failure) => Some(failure),
        }
    }
}

/// Composite result, one entry per probe.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosticsReport {
    pub server_info: ProbeOutcome<ServerInfo>,
    pub request_info: ProbeOutcome<RequestInfo>,
    pub database_check: ProbeOutcome<DatabaseCheck>,
    pub storage_check: ProbeOutcome<StorageCheck>,
    pub environment: ProbeOutcome<EnvironmentInfo>,
}

/// Runs the diagnostics probes against the configured collaborators.
pub struct DiagnosticsProbe {
    config: SharedConfig,
    store: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
}

impl DiagnosticsProbe {
    pub fn new(config: SharedConfig, store: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            config,
            store,
            blobs,
        }
    }

    /// Run every probe in order. Never fails as a whole.
    pub async fn run(&self, request: &RequestMeta) -> DiagnosticsReport {
        let config = self.config.load_full();

        DiagnosticsReport {
            server_info: isolate("server_info", async { self.server_info(&config, request) }).await,
            request_info: isolate("request_info", async { self.request_info(request) }).await,
            database_check: isolate("database_check", self.database_check(&config)).await,
            storage_check: isolate("storage_check", self.storage_check(&config)).await,
            environment: isolate("environment", async { self.environment(&config) }).await,
        }
    }

    pub fn server_info(&self, config: &AppConfig, request: &RequestMeta) -> ServerInfo {
        ServerInfo {
            app_name: config.app.name.clone(),
            app_version: env!("CARGO_PKG_VERSION"),
            server_software: format!("{}/{} (axum)", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
            server_protocol: request.protocol.clone(),
            request_time: Utc::now().timestamp(),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            pid: std::process::id(),
            max_upload_size: config.security.max_upload_size,
            max_post_size: config.security.max_body_size,
        }
    }

    pub fn request_info(&self, request: &RequestMeta) -> RequestInfo {
        RequestInfo {
            ip: request.ip.clone(),
            user_agent: request.user_agent.clone(),
            method: request.method.clone(),
            url: request.url.clone(),
            path: request.path.clone(),
            content_type: request.content_type.clone(),
            accept: request.accept.clone(),
            authorization: if request.has_authorization { "Present" } else { "Missing" },
        }
    }

    pub async fn database_check(&self, config: &AppConfig) -> DatabaseCheck {
        let summary = config
            .database
            .connection_summary()
            .unwrap_or_else(|| ConnectionSummary {
                driver: "unknown".to_string(),
                host: None,
                database: None,
            });

        let mut check = DatabaseCheck {
            connection_successful: false,
            connection_error: None,
            config: summary,
            table_access: false,
            table_error: None,
            user_count: None,
        };

        if let Err(e) = self.store.ping().await {
            tracing::warn!(error = %e, "Database connectivity probe failed");
            check.connection_error = Some(e.to_string());
            check.table_error = Some(DATABASE_CONNECTION_FAILED.to_string());
            return check;
        }
        check.connection_successful = true;

        match self.store.count(&config.database.probe_table).await {
            Ok(count) => {
                check.table_access = true;
                check.user_count = Some(count);
            }
            Err(e) => {
                tracing::warn!(table = %config.database.probe_table, error = %e, "Table access probe failed");
                check.table_error = Some(e.to_string());
            }
        }
        check
    }

    pub async fn storage_check(&self, config: &AppConfig) -> StorageCheck {
        let now = Utc::now();
        let key = format!(
            "{}/test_{}_{:08x}.txt",
            STORAGE_TEST_PREFIX,
            now.timestamp(),
            fastrand::u32(..)
        );
        let contents = format!("API Diagnostics Test - {}", now.format(TIMESTAMP_FORMAT));

        let outcome = match self.blobs.put(&key, contents.as_bytes()).await {
            Ok(()) => match self.blobs.exists(&key).await {
                Ok(true) => Ok(()),
                Ok(false) => Err("Failed to write test file".to_string()),
                Err(e) => Err(e.to_string()),
            },
            Err(e) => Err(e.to_string()),
        };

        if outcome.is_ok() {
            if let Err(e) = self.blobs.delete(&key).await {
                tracing::warn!(key = %key, error = %e, "Storage probe cleanup failed");
            }
        }

        let link = Path::new(&config.storage.public_path).join("storage");
        let symbolic_link_exists = tokio::fs::symlink_metadata(&link)
            .await
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false);

        StorageCheck {
            public_disk_writable: outcome.is_ok(),
            public_disk_error: outcome.err(),
            storage_path: config.storage.storage_path.clone(),
            public_path: config.storage.public_path.clone(),
            public_disk_path: config.storage.public_disk_path.clone(),
            symbolic_link_exists,
        }
    }

    pub fn environment(&self, config: &AppConfig) -> EnvironmentInfo {
        EnvironmentInfo {
            app_env: config.app.env.clone(),
            app_debug: config.app.debug,
            app_url: config.app.url.clone(),
            timezone: config.app.timezone.clone(),
            cors: config.cors.clone(),
            logging_channel: config.logging.channel.clone(),
        }
    }
}

async fn isolate<T, F>(probe: &'static str, fut: F) -> ProbeOutcome<T>
where
    F: Future<Output = T>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(value) => {
            metrics::record_probe(probe, true);
            ProbeOutcome::Completed(value)
        }
        Err(payload) => {
            let error = panic_message(payload.as_ref());
            tracing::error!(probe, error = %error, "Diagnostics probe aborted");
            metrics::record_probe(probe, false);
            ProbeOutcome::Failed(ProbeFailure::new(error))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "probe panicked".to_string()
    }
}
