// mysql-backup/src/config/mod.rs
mod connection;

pub use connection::{ConnectionSpec, JsonConnection, resolve_connection};

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::errors::BackupError;
use crate::storage::StorageLocation;
use crate::storage::local::LocalStorage;
use crate::storage::s3::S3Storage;

pub const DEFAULT_CONFIG_PATH: &str = "backup.json";
const DEFAULT_LOCAL_ROOT: &str = "storage";
const DEFAULT_BACKUP_PATH: &str = "backups";
pub const LOCAL_DISK: &str = "local";
pub const CLOUD_DISK: &str = "s3";

// Structs for deserializing backup.json
#[derive(Debug, Clone, Deserialize)]
pub struct JsonS3StorageConfig {
    pub bucket_name: Option<String>,
    pub region: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonLocalStorage {
    pub root: Option<PathBuf>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonCloudStorage {
    #[serde(default)]
    pub enabled: bool,
    pub keep_local: Option<bool>,
    pub path: Option<String>,
    pub s3: Option<JsonS3StorageConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JsonBinaries {
    pub dump: Option<String>,
    pub restore: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJsonConfig {
    pub default_connection: Option<String>,
    #[serde(default)]
    pub connections: BTreeMap<String, JsonConnection>,
    pub compress: Option<bool>,
    pub local_storage: Option<JsonLocalStorage>,
    pub cloud_storage: Option<JsonCloudStorage>,
    pub binaries: Option<JsonBinaries>,
}

// Application's internal configuration structs
#[derive(Debug, Clone)]
pub struct SpacesConfig {
    pub endpoint_url: Option<String>,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
}

#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    pub root: PathBuf,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct CloudStorageConfig {
    /// Upload every dump to the cloud disk.
    pub sync_enabled: bool,
    /// Keep the local copy after a successful upload.
    pub keep_local: bool,
    pub path: String,
    pub spaces: Option<SpacesConfig>,
}

#[derive(Debug, Clone)]
pub struct Binaries {
    pub dump: String,
    pub restore: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub connections: BTreeMap<String, ConnectionSpec>,
    pub default_connection: Option<String>,
    pub compress: bool,
    pub local_storage: LocalStorageConfig,
    pub cloud_storage: CloudStorageConfig,
    pub binaries: Binaries,
}

impl AppConfig {
    pub fn load_from_json(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file at {}", config_path.display()))?;
        Self::from_json_str(&config_content).with_context(|| {
            format!(
                "Failed to parse JSON from config file at {}",
                config_path.display()
            )
        })
    }

    pub fn from_json_str(config_content: &str) -> Result<Self> {
        let raw_json_config: RawJsonConfig = serde_json::from_str(config_content)?;
        Self::from_raw(raw_json_config)
    }

    fn from_raw(raw: RawJsonConfig) -> Result<Self> {
        let mut connections = BTreeMap::new();
        for (name, entry) in &raw.connections {
            connections.insert(name.clone(), entry.to_spec(name)?);
        }
        if connections.is_empty() {
            return Err(anyhow::anyhow!("At least one entry in 'connections' must be configured."));
        }
        if let Some(default) = &raw.default_connection {
            if !connections.contains_key(default) {
                return Err(anyhow::anyhow!(
                    "default_connection '{}' does not match any entry in 'connections'.",
                    default
                ));
            }
        }

        let local_raw = raw.local_storage.unwrap_or_default();
        let local_storage = LocalStorageConfig {
            root: local_raw.root.unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_ROOT)),
            path: local_raw.path.unwrap_or_else(|| DEFAULT_BACKUP_PATH.to_string()),
        };

        let cloud_raw = raw.cloud_storage.unwrap_or_default();
        let spaces = cloud_raw.s3.as_ref().and_then(parse_spaces_config);
        if cloud_raw.enabled && spaces.is_none() {
            println!("⚠️ cloud_storage.enabled is true but S3 credentials are incomplete. Cloud sync will be disabled.");
        }
        let cloud_storage = CloudStorageConfig {
            sync_enabled: cloud_raw.enabled && spaces.is_some(),
            keep_local: cloud_raw.keep_local.unwrap_or(true),
            path: cloud_raw.path.unwrap_or_else(|| DEFAULT_BACKUP_PATH.to_string()),
            spaces,
        };

        let binaries_raw = raw.binaries.unwrap_or_default();
        let binaries = Binaries {
            dump: binaries_raw.dump.unwrap_or_else(|| "mysqldump".to_string()),
            restore: binaries_raw.restore.unwrap_or_else(|| "mysql".to_string()),
        };

        Ok(AppConfig {
            connections,
            default_connection: raw.default_connection,
            compress: raw.compress.unwrap_or(true),
            local_storage,
            cloud_storage,
            binaries,
        })
    }

    /// Connection for this invocation, honoring a `--database` override.
    pub fn connection(&self, requested: Option<&str>) -> crate::errors::Result<ConnectionSpec> {
        resolve_connection(&self.connections, self.default_connection.as_deref(), requested)
    }

    pub fn local_location(&self) -> StorageLocation {
        StorageLocation::new(
            Arc::new(LocalStorage::new(LOCAL_DISK, &self.local_storage.root)),
            self.local_storage.path.clone(),
        )
    }

    pub async fn cloud_location(&self) -> crate::errors::Result<StorageLocation> {
        let spaces = self.cloud_storage.spaces.as_ref().ok_or_else(|| {
            BackupError::Config(
                "cloud_storage.s3 is not fully configured (bucket_name, region, access_key_id, secret_access_key are required)."
                    .to_string(),
            )
        })?;
        Ok(StorageLocation::new(
            Arc::new(S3Storage::connect(CLOUD_DISK, spaces).await),
            self.cloud_storage.path.clone(),
        ))
    }
}

fn parse_spaces_config(s3_raw: &JsonS3StorageConfig) -> Option<SpacesConfig> {
    if let (Some(bucket), Some(region), Some(key_id), Some(secret)) = (
        s3_raw.bucket_name.as_ref().filter(|s| !s.is_empty()),
        s3_raw.region.as_ref().filter(|s| !s.is_empty()),
        s3_raw.access_key_id.as_ref().filter(|s| !s.is_empty()),
        s3_raw.secret_access_key.as_ref().filter(|s| !s.is_empty()),
    ) {
        Some(SpacesConfig {
            bucket_name: bucket.clone(),
            region: region.clone(),
            access_key_id: key_id.clone(),
            secret_access_key: secret.clone(),
            endpoint_url: s3_raw.endpoint_url.clone().filter(|s| !s.is_empty()),
        })
    } else {
        None
    }
}
