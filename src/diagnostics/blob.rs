//! Blob store collaborator (public disk).

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid blob path '{0}'")]
    InvalidPath(String),

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, contents: &[u8]) -> Result<(), BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;
}

/// Blob store rooted at a local directory. Keys are relative paths.
pub struct LocalDiskStore {
    root: PathBuf,
}

impl LocalDiskStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(BlobError::InvalidPath(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn io(op: &'static str, path: &Path) -> impl FnOnce(std::io::Error) -> BlobError {
    let path = path.to_path_buf();
    move |source| BlobError::Io { op, path, source }
}

#[async_trait]
impl BlobStore for LocalDiskStore {
    async fn put(&self, key: &str, contents: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io("create directory", parent))?;
        }
        tokio::fs::write(&path, contents)
            .await
            .map_err(io("write", &path))
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.resolve(key)?;
        tokio::fs::try_exists(&path).await.map_err(io("stat", &path))
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path).await.map_err(io("delete", &path))
    }
}
