//! Storage backends for backup files
//!
//! Dumps are written to and read from two independently configured disks:
//! a local directory and an S3-compatible bucket. Both sit behind the
//! [`StorageBackend`] trait so the pipelines never care which one they talk to.

pub mod local;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::Result;
use crate::utils::{clean_path, join_path};

/// Byte-addressable storage keyed by `/`-separated paths.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Disk name used in operator messages (e.g. "local", "s3").
    fn name(&self) -> &str;

    /// Writes the whole payload, replacing any existing file.
    async fn put(&self, path: &str, contents: &[u8]) -> Result<()>;

    async fn get(&self, path: &str) -> Result<Vec<u8>>;

    async fn has(&self, path: &str) -> Result<bool>;

    async fn delete(&self, path: &str) -> Result<()>;

    /// Lists the files directly under `dir`, returned as full storage paths.
    async fn list(&self, dir: &str) -> Result<Vec<String>>;
}

/// A disk plus the path prefix backups live under.
#[derive(Clone)]
pub struct StorageLocation {
    pub backend: Arc<dyn StorageBackend>,
    pub prefix: String,
}

impl StorageLocation {
    pub fn new(backend: Arc<dyn StorageBackend>, prefix: impl Into<String>) -> Self {
        Self {
            backend,
            prefix: prefix.into(),
        }
    }

    pub fn disk(&self) -> &str {
        self.backend.name()
    }

    /// Storage path of a backup file inside this location.
    pub fn file_path(&self, filename: &str) -> String {
        join_path(&self.prefix, filename)
    }

    /// Strips this location's prefix from a listed storage path.
    pub fn file_name<'a>(&self, path: &'a str) -> &'a str {
        let prefix = clean_path(&self.prefix);
        let path = path.trim_start_matches('/');
        if prefix.is_empty() {
            return path;
        }
        path.strip_prefix(prefix)
            .and_then(|rest| rest.strip_prefix('/'))
            .unwrap_or(path)
    }

    pub async fn put(&self, filename: &str, contents: &[u8]) -> Result<()> {
        self.backend.put(&self.file_path(filename), contents).await
    }

    pub async fn get(&self, filename: &str) -> Result<Vec<u8>> {
        self.backend.get(&self.file_path(filename)).await
    }

    pub async fn has(&self, filename: &str) -> Result<bool> {
        self.backend.has(&self.file_path(filename)).await
    }

    pub async fn delete(&self, filename: &str) -> Result<()> {
        self.backend.delete(&self.file_path(filename)).await
    }

    /// File names (prefix stripped) in listing order.
    pub async fn files(&self) -> Result<Vec<String>> {
        let paths = self.backend.list(clean_path(&self.prefix)).await?;
        Ok(paths.iter().map(|p| self.file_name(p).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::local::LocalStorage;

    #[test]
    fn test_file_name_strips_prefix() {
        let location = StorageLocation::new(Arc::new(LocalStorage::new("local", "/tmp")), "/backups/mysql/");
        assert_eq!(location.file_path("shop.sql"), "backups/mysql/shop.sql");
        assert_eq!(location.file_name("backups/mysql/shop.sql"), "shop.sql");
        assert_eq!(location.file_name("/backups/mysql/shop.sql"), "shop.sql");
        assert_eq!(location.file_name("other/shop.sql"), "other/shop.sql");
    }

    #[test]
    fn test_file_name_with_empty_prefix() {
        let location = StorageLocation::new(Arc::new(LocalStorage::new("local", "/tmp")), "");
        assert_eq!(location.file_path("shop.sql"), "/shop.sql");
        assert_eq!(location.file_name("shop.sql"), "shop.sql");
    }

    #[tokio::test]
    async fn test_location_round_trip_through_backend() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let location = StorageLocation::new(Arc::new(LocalStorage::new("local", dir.path())), "backups");

        location.put("shop.sql", b"-- dump").await?;
        assert!(location.has("shop.sql").await?);
        assert_eq!(location.get("shop.sql").await?, b"-- dump");
        assert_eq!(location.files().await?, vec!["shop.sql".to_string()]);

        location.delete("shop.sql").await?;
        assert!(!location.has("shop.sql").await?);
        Ok(())
    }
}
