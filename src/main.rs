//! API monitor server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ api_logger ──▶ /api handlers
//!                                        │              │
//!                                        ▼              ▼
//!                              storage/logs/api-*.log   diagnostics probes
//!                                        │              (record store, public disk)
//!                                        ▼
//!                              analyze-api-logs (separate process)
//! ```

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use api_monitor::config::{self, load_config, AppConfig, ConfigWatcher};
use api_monitor::diagnostics::{LocalDiskStore, SqliteRecordStore};
use api_monitor::observability::{logging, metrics, ApiLogChannel};
use api_monitor::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "api-monitor")]
#[command(about = "API request logging and diagnostics server")]
struct Args {
    /// TOML configuration file; defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let app_config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init_tracing(&logging::default_filter(&app_config.observability.log_level));
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "api-monitor starting");
    tracing::info!(
        bind_address = %app_config.listener.bind_address,
        request_timeout_secs = app_config.timeouts.request_secs,
        log_directory = %app_config.logging.directory,
        "Configuration loaded"
    );

    if app_config.observability.metrics_enabled {
        match app_config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %app_config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let channel = Arc::new(ApiLogChannel::from_config(&app_config.logging));
    let store = Arc::new(SqliteRecordStore::connect_lazy(&app_config.database)?);
    let blobs = Arc::new(LocalDiskStore::new(&app_config.storage.public_disk_path));

    // Keep the watcher alive for the lifetime of the server.
    let (updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, app_config.clone());
            (updates, Some(watcher.run()?))
        }
        None => (mpsc::unbounded_channel().1, None),
    };

    let listener = TcpListener::bind(&app_config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config::shared(app_config), channel, store, blobs);
    server.run(listener, updates).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
