use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

/// Object store for submission evidence. Keys are opaque to callers; the
/// core never interprets them beyond passing them back here.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn put_object(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<()>;
    async fn get_object(&self, key: &str) -> Result<Vec<u8>>;
    async fn delete_object(&self, key: &str) -> Result<()>;
}

/// Filesystem-backed object store rooted at the configured uploads
/// directory. Suitable for single-node deployments; the trait keeps an S3
/// swap possible without touching callers.
pub struct FsObjectStorage {
    root: PathBuf,
}

impl FsObjectStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, key: &str) -> Result<PathBuf> {
        // Keys are flat names; anything path-like is rejected.
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            return Err(AppError::Storage(format!("Invalid object key: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for FsObjectStorage {
    async fn put_object(&self, key: &str, bytes: &[u8], _content_type: &str) -> Result<()> {
        let path = self.object_path(key)?;

        fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create uploads directory: {}", e)))?;

        let mut file = fs::File::create(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to create object: {}", e)))?;

        file.write_all(bytes)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write object: {}", e)))?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(key)?;

        fs::read(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to read object {}: {}", key, e)))
    }

    async fn delete_object(&self, key: &str) -> Result<()> {
        let path = self.object_path(key)?;

        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete object {}: {}", key, e)))?;
        }

        Ok(())
    }
}
