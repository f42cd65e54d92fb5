//! Local filesystem disk rooted at a configured directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs as tokio_fs;
use tracing::debug;

use super::StorageBackend;
use crate::errors::{BackupError, Result};

pub struct LocalStorage {
    name: String,
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(name: impl Into<String>, root: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            root: root.as_ref().to_path_buf(),
        }
    }

    fn full_path(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, contents: &[u8]) -> Result<()> {
        let full_path = self.full_path(path);
        if let Some(parent) = full_path.parent() {
            if !parent.exists() {
                tokio_fs::create_dir_all(parent).await?;
            }
        }
        debug!("Writing {} bytes to {}", contents.len(), full_path.display());
        tokio_fs::write(&full_path, contents).await?;
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(path);
        debug!("Reading {}", full_path.display());
        tokio_fs::read(&full_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => BackupError::FileNotFound {
                file: path.to_string(),
                disk: self.name.clone(),
            },
            _ => BackupError::Io(e),
        })
    }

    async fn has(&self, path: &str) -> Result<bool> {
        match tokio_fs::metadata(self.full_path(path)).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BackupError::Io(e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.full_path(path);
        debug!("Deleting {}", full_path.display());
        match tokio_fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BackupError::Io(e)),
        }
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let dir = dir.trim_matches('/');
        let full_dir = self.full_path(dir);
        if !full_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = tokio_fs::read_dir(&full_dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if dir.is_empty() {
                files.push(name);
            } else {
                files.push(format!("{}/{}", dir, name));
            }
        }
        // read_dir order is platform dependent; keep listings stable.
        files.sort();
        Ok(files)
    }
}
