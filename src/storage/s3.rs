// S3-compatible object storage disk (AWS S3, DigitalOcean Spaces, MinIO...)
use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::config::Region;
use s3::error::DisplayErrorContext;
use s3::primitives::ByteStream;
use tracing::{debug, info};

use super::StorageBackend;
use crate::config::SpacesConfig;
use crate::errors::{BackupError, Result};

pub struct S3Storage {
    name: String,
    client: s3::Client,
    bucket: String,
}

impl S3Storage {
    /// Builds a client with the static credentials from the configuration.
    pub async fn connect(name: impl Into<String>, spaces_config: &SpacesConfig) -> Self {
        let mut loader = aws_config::defaults(s3::config::BehaviorVersion::latest())
            .region(Region::new(spaces_config.region.clone()))
            .credentials_provider(s3::config::Credentials::new(
                &spaces_config.access_key_id,
                &spaces_config.secret_access_key,
                None, // session_token
                None, // expiry
                "Static",
            ));
        if let Some(endpoint) = &spaces_config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self {
            name: name.into(),
            client: s3::Client::new(&sdk_config),
            bucket: spaces_config.bucket_name.clone(),
        }
    }

    fn storage_error<E>(&self, operation: &str, key: &str, err: E) -> BackupError
    where
        E: std::error::Error,
    {
        BackupError::Storage(format!(
            "S3 {} of s3://{}/{} failed: {}",
            operation,
            self.bucket,
            key,
            DisplayErrorContext(&err)
        ))
    }
}

/// Object keys never start with a separator.
fn object_key(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Prefix for listing the direct children of `dir`.
fn list_prefix(dir: &str) -> Option<String> {
    let dir = dir.trim_matches('/');
    if dir.is_empty() {
        None
    } else {
        Some(format!("{}/", dir))
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn put(&self, path: &str, contents: &[u8]) -> Result<()> {
        let key = object_key(path);
        debug!("Uploading {} bytes to s3://{}/{}", contents.len(), self.bucket, key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(contents.to_vec()))
            .send()
            .await
            .map_err(|e| self.storage_error("upload", key, e))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Vec<u8>> {
        let key = object_key(path);
        debug!("Downloading s3://{}/{}", self.bucket, key);

        let object = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.storage_error("download", key, e))?;

        let data = object
            .body
            .collect()
            .await
            .map_err(|e| self.storage_error("download", key, e))?
            .into_bytes();

        info!("Downloaded {} bytes from s3://{}/{}", data.len(), self.bucket, key);
        Ok(data.to_vec())
    }

    async fn has(&self, path: &str) -> Result<bool> {
        let key = object_key(path);
        match self.client.head_object().bucket(&self.bucket).key(key).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                if err.as_service_error().map(|e| e.is_not_found()).unwrap_or(false) {
                    debug!("s3://{}/{} does not exist", self.bucket, key);
                    Ok(false)
                } else {
                    Err(self.storage_error("head", key, err))
                }
            }
        }
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let key = object_key(path);
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| self.storage_error("delete", key, e))?;
        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn list(&self, dir: &str) -> Result<Vec<String>> {
        let prefix = list_prefix(dir);
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let resp = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .set_prefix(prefix.clone())
                .delimiter("/")
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| self.storage_error("list", prefix.as_deref().unwrap_or(""), e))?;

            keys.extend(
                resp.contents()
                    .iter()
                    .filter_map(|obj| obj.key())
                    .filter(|key| !key.ends_with('/'))
                    .map(str::to_string),
            );

            match resp.next_continuation_token() {
                Some(token) => continuation_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Found {} objects under s3://{}/{}", keys.len(), self.bucket, prefix.as_deref().unwrap_or(""));
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_drops_leading_separator() {
        assert_eq!(object_key("/shop.sql"), "shop.sql");
        assert_eq!(object_key("backups/shop.sql"), "backups/shop.sql");
    }

    #[test]
    fn test_list_prefix() {
        assert_eq!(list_prefix(""), None);
        assert_eq!(list_prefix("/"), None);
        assert_eq!(list_prefix("/backups/mysql/"), Some("backups/mysql/".to_string()));
    }
}
