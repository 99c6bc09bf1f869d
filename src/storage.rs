//! Asset storage backends.
//!
//! Templates and the embedded font are read-only blobs addressed by a path
//! relative to the asset root. Production reads them from a static host over
//! HTTP; local development reads them from a directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("asset not found: {0}")]
    NotFound(String),
    #[error("failed to fetch asset {path}: {message}")]
    Fetch { path: String, message: String },
}

#[async_trait]
pub trait ObjectStorage {
    /// Download the full content of the asset at `path`.
    async fn download_file(&self, path: &str) -> Result<Vec<u8>, StorageError>;

    fn get_asset_url(&self, path: &str) -> String;
}

/// Assets served by a static host or a public storage bucket.
pub struct HttpStorage {
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpStorage {
    pub fn new(base_url: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl ObjectStorage for HttpStorage {
    async fn download_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.get_asset_url(path);
        log::debug!("Fetching asset {} from {}", path, url);

        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Fetch {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(StorageError::Fetch {
                path: path.to_string(),
                message: format!("unexpected status {}", status),
            });
        }

        let bytes = response.bytes().await.map_err(|e| StorageError::Fetch {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        Ok(bytes.to_vec())
    }

    fn get_asset_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Assets read from a directory on the local filesystem.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve `path` below the root. Paths escaping the root resolve to `None`.
    fn resolve(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn download_file(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let file_path = self
            .resolve(path)
            .ok_or_else(|| StorageError::NotFound(path.to_string()))?;
        log::debug!("Reading asset {} from {}", path, file_path.display());

        match tokio::fs::read(&file_path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(e) => Err(StorageError::Fetch {
                path: path.to_string(),
                message: e.to_string(),
            }),
        }
    }

    fn get_asset_url(&self, path: &str) -> String {
        match self.resolve(path) {
            Some(file_path) => format!("file://{}", file_path.display()),
            None => String::new(),
        }
    }
}
