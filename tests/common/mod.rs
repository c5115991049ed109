//! Shared utilities for the integration tests.

#![allow(dead_code)]

use api_monitor::config::{shared, AppConfig, SharedConfig};
use api_monitor::diagnostics::{LocalDiskStore, RecordStore, StoreError};
use api_monitor::{ApiLogChannel, HttpServer};
use async_trait::async_trait;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A server running on an ephemeral port, with its files under one directory.
pub struct TestServer {
    pub addr: SocketAddr,
    pub log_dir: PathBuf,
    pub config: SharedConfig,
    pub updates: mpsc::UnboundedSender<AppConfig>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Configuration rooted at `dir` with an absent SQLite database.
pub fn test_config(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.logging.directory = dir.join("logs").display().to_string();
    config.database.url = format!("sqlite:{}", dir.join("absent").join("db.sqlite").display());
    config.storage.storage_path = dir.join("storage").display().to_string();
    config.storage.public_path = dir.join("public").display().to_string();
    config.storage.public_disk_path = dir.join("storage").join("public").display().to_string();
    config
}

pub async fn start_server(config: AppConfig, store: Arc<dyn RecordStore>) -> TestServer {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log_dir = PathBuf::from(&config.logging.directory);

    let channel = Arc::new(ApiLogChannel::from_config(&config.logging));
    let blobs = Arc::new(LocalDiskStore::new(&config.storage.public_disk_path));
    let snapshot = shared(config);
    let server = HttpServer::new(snapshot.clone(), channel, store, blobs);

    let (updates, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestServer {
        addr,
        log_dir,
        config: snapshot,
        updates,
    }
}

/// Record store whose database never answers.
pub struct UnreachableStore;

#[async_trait]
impl RecordStore for UnreachableStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }

    async fn count(&self, _table: &str) -> Result<u64, StoreError> {
        Err(StoreError::Database(sqlx::Error::PoolTimedOut))
    }
}

/// Contents of every file in `dir`, concatenated.
pub fn read_logs(dir: &Path) -> String {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    paths
        .iter()
        .map(|p| std::fs::read_to_string(p).unwrap())
        .collect()
}
