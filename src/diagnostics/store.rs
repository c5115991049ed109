//! Record store collaborator.
//!
//! The diagnostics probe only needs two operations from the application
//! database: a trivial connectivity query and a row count.

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use thiserror::Error;

use crate::config::validation::is_identifier;
use crate::config::DatabaseConfig;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("invalid table name '{0}'")]
    InvalidTable(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Run a trivial query to prove the connection works.
    async fn ping(&self) -> Result<(), StoreError>;

    /// Count the rows of `table`.
    async fn count(&self, table: &str) -> Result<u64, StoreError>;
}

/// SQLite-backed record store.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Build a lazily connecting pool. Nothing touches the database until
    /// the first query, so a missing database surfaces in the probe rather
    /// than at startup.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?;
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_lazy_with(options);
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn count(&self, table: &str) -> Result<u64, StoreError> {
        if !is_identifier(table) {
            return Err(StoreError::InvalidTable(table.to_string()));
        }
        let sql = format!("SELECT COUNT(*) FROM {}", table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;
        Ok(count.max(0) as u64)
    }
}
