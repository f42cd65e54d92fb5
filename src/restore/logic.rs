use std::path::PathBuf;

use tracing::warn;

use crate::backup::compression::gzip_decompress;
use crate::backup::naming::GZIP_EXTENSION;
use crate::config::ConnectionSpec;
use crate::errors::{BackupError, Result};
use crate::restore::catalog::{CatalogFilter, select_backup_file};
use crate::restore::db_restore::{cloud_local_name, decompressed_name, restore_invocation};
use crate::storage::StorageLocation;
use crate::utils::process::ProcessRunner;
use crate::utils::prompt::{Prompt, confirm_or_abort};

/// Options of `backup restore`.
#[derive(Debug, Clone, Default)]
pub struct RestoreOptions {
    pub filename: Option<String>,
    pub all_backup_files: bool,
    pub from_cloud: bool,
    pub latest: bool,
    pub assume_yes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreReport {
    pub database: String,
    pub disk: String,
    pub filename: String,
}

pub struct RestorePipeline<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub prompt: &'a dyn Prompt,
    pub restore_binary: PathBuf,
    pub local: StorageLocation,
    pub cloud: Option<StorageLocation>,
}

impl RestorePipeline<'_> {
    fn source(&self, from_cloud: bool) -> Result<&StorageLocation> {
        if from_cloud {
            self.cloud
                .as_ref()
                .ok_or_else(|| BackupError::Config("Cloud storage is not configured".to_string()))
        } else {
            Ok(&self.local)
        }
    }

    /// Selects, confirms and restores a backup into `connection`'s database.
    ///
    /// Local scratch files (cloud download, decompressed copy) are removed on
    /// every path once staging has started, whether the restore succeeded or not.
    pub async fn run(&self, connection: &ConnectionSpec, options: &RestoreOptions) -> Result<RestoreReport> {
        let source = self.source(options.from_cloud)?;
        let filter = CatalogFilter::Restorable {
            database: &connection.database,
            include_all: options.all_backup_files,
        };
        let question = format!(
            "Which database backup file do you want to restore from '{}' disk?",
            source.disk()
        );
        let filename = select_backup_file(
            source,
            &filter,
            options.filename.as_deref(),
            options.latest,
            self.prompt,
            &question,
        )
        .await?;

        confirm_or_abort(
            self.prompt,
            options.assume_yes,
            &format!(
                "Are you sure that you want to restore database '{}' from '{}'?",
                connection.database, filename
            ),
        )?;

        let mut scratch = Vec::new();
        let outcome = self
            .stage_and_restore(connection, source, &filename, options.from_cloud, &mut scratch)
            .await;
        self.cleanup(&scratch).await;
        outcome
    }

    async fn stage_and_restore(
        &self,
        connection: &ConnectionSpec,
        source: &StorageLocation,
        filename: &str,
        from_cloud: bool,
        scratch: &mut Vec<String>,
    ) -> Result<RestoreReport> {
        let mut local_name = filename.to_string();
        if from_cloud {
            let payload = source.get(filename).await?;
            local_name = cloud_local_name(filename);
            scratch.push(local_name.clone());
            self.local.put(&local_name, &payload).await?;
            println!(
                "☁️ Downloaded {} from '{}' disk to {}",
                filename,
                source.disk(),
                self.local.file_path(&local_name)
            );
        }

        let stored = self.local.get(&local_name).await?;
        let dump = if local_name.ends_with(GZIP_EXTENSION) {
            let payload = gzip_decompress(&stored).map_err(|e| BackupError::Corrupt {
                file: local_name.clone(),
                source: e,
            })?;
            let temp_name = decompressed_name(&local_name);
            scratch.push(temp_name.clone());
            self.local.put(&temp_name, &payload).await?;
            payload
        } else {
            stored
        };

        println!("🔄 Restoring database {} from {}...", connection.database, filename);
        let invocation = restore_invocation(&self.restore_binary, connection, dump);
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            eprintln!(
                "❌ Restore of database {} from '{}' disk file {} failed",
                connection.database,
                source.disk(),
                filename
            );
            return Err(BackupError::RestoreFailed {
                database: connection.database.clone(),
                disk: source.disk().to_string(),
                file: filename.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        println!(
            "✅ Database {} restored from '{}' disk file {}",
            connection.database,
            source.disk(),
            filename
        );
        Ok(RestoreReport {
            database: connection.database.clone(),
            disk: source.disk().to_string(),
            filename: filename.to_string(),
        })
    }

    async fn cleanup(&self, scratch: &[String]) {
        for name in scratch {
            if let Err(e) = self.local.delete(name).await {
                warn!("Failed to delete scratch file {}: {}", name, e);
                eprintln!("⚠️ Could not delete temporary file {}: {}", self.local.file_path(name), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backup::compression::gzip_compress;
    use crate::storage::local::LocalStorage;
    use crate::utils::process::{MockProcessRunner, ProcessOutput};
    use crate::utils::prompt::MockPrompt;
    use std::sync::Arc;
    use tempfile::TempDir;

    const DUMP: &[u8] = b"-- dump\nINSERT INTO orders VALUES (1);";

    fn connection() -> ConnectionSpec {
        ConnectionSpec {
            host: "127.0.0.1".into(),
            port: Some("3306".into()),
            database: "shop".into(),
            username: "root".into(),
            password: "secret".into(),
        }
    }

    fn location(dir: &TempDir, name: &str) -> StorageLocation {
        StorageLocation::new(Arc::new(LocalStorage::new(name, dir.path())), "backups")
    }

    fn runner_expecting_dump(exit_code: i32) -> MockProcessRunner {
        let mut runner = MockProcessRunner::new();
        runner
            .expect_run()
            .withf(|inv| inv.stdin.as_deref() == Some(DUMP) && inv.args.last().map(String::as_str) == Some("shop"))
            .times(1)
            .returning(move |_| {
                Ok(ProcessOutput {
                    stdout_lines: Vec::new(),
                    stderr: if exit_code == 0 { String::new() } else { "ERROR 1064".into() },
                    exit_code,
                })
            });
        runner
    }

    fn idle_runner() -> MockProcessRunner {
        let mut runner = MockProcessRunner::new();
        runner.expect_run().never();
        runner
    }

    fn yes_options(filename: &str) -> RestoreOptions {
        RestoreOptions {
            filename: Some(filename.to_string()),
            assume_yes: true,
            ..RestoreOptions::default()
        }
    }

    #[tokio::test]
    async fn test_restore_compressed_local_file_cleans_temp() -> anyhow::Result<()> {
        for exit_code in [0, 1] {
            let local_dir = tempfile::tempdir()?;
            let local = location(&local_dir, "local");
            local.put("shop_20240102030405.sql.gz", &gzip_compress(DUMP)?).await?;

            let runner = runner_expecting_dump(exit_code);
            let prompt = MockPrompt::new();
            let pipeline = RestorePipeline {
                runner: &runner,
                prompt: &prompt,
                restore_binary: PathBuf::from("mysql"),
                local: local.clone(),
                cloud: None,
            };

            let result = pipeline.run(&connection(), &yes_options("shop_20240102030405.sql.gz")).await;
            if exit_code == 0 {
                let report = result?;
                assert_eq!(report.disk, "local");
                assert_eq!(report.filename, "shop_20240102030405.sql.gz");
            } else {
                assert!(matches!(result, Err(BackupError::RestoreFailed { ref database, .. }) if database == "shop"));
            }

            assert!(!local.has("shop_20240102030405.tmp").await?);
            assert!(local.has("shop_20240102030405.sql.gz").await?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_plain_sql_creates_no_scratch() -> anyhow::Result<()> {
        let local_dir = tempfile::tempdir()?;
        let local = location(&local_dir, "local");
        local.put("shop_1.sql", DUMP).await?;

        let runner = runner_expecting_dump(0);
        let prompt = MockPrompt::new();
        let pipeline = RestorePipeline {
            runner: &runner,
            prompt: &prompt,
            restore_binary: PathBuf::from("mysql"),
            local: local.clone(),
            cloud: None,
        };

        pipeline.run(&connection(), &yes_options("shop_1.sql")).await?;
        assert_eq!(local.files().await?, vec!["shop_1.sql".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_from_cloud_removes_downloaded_copies() -> anyhow::Result<()> {
        for exit_code in [0, 3] {
            let local_dir = tempfile::tempdir()?;
            let cloud_dir = tempfile::tempdir()?;
            let local = location(&local_dir, "local");
            let cloud = location(&cloud_dir, "s3");
            cloud.put("shop_2.sql.gz", &gzip_compress(DUMP)?).await?;

            let runner = runner_expecting_dump(exit_code);
            let prompt = MockPrompt::new();
            let pipeline = RestorePipeline {
                runner: &runner,
                prompt: &prompt,
                restore_binary: PathBuf::from("mysql"),
                local: local.clone(),
                cloud: Some(cloud.clone()),
            };

            let options = RestoreOptions {
                from_cloud: true,
                latest: true,
                assume_yes: true,
                ..RestoreOptions::default()
            };
            let result = pipeline.run(&connection(), &options).await;
            assert_eq!(result.is_ok(), exit_code == 0);
            if let Err(BackupError::RestoreFailed { disk, file, .. }) = &result {
                assert_eq!(disk, "s3");
                assert_eq!(file, "shop_2.sql.gz");
            }

            assert!(local.files().await?.is_empty());
            assert!(cloud.has("shop_2.sql.gz").await?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_plain_sql_from_cloud_removes_downloaded_copy() -> anyhow::Result<()> {
        for exit_code in [0, 1] {
            let local_dir = tempfile::tempdir()?;
            let cloud_dir = tempfile::tempdir()?;
            let local = location(&local_dir, "local");
            let cloud = location(&cloud_dir, "s3");
            cloud.put("shop_1.sql", DUMP).await?;

            // The downloaded copy must be on the local disk while the client runs.
            let downloaded = local_dir.path().join("backups").join("shop_1.cloud.sql");
            let mut runner = MockProcessRunner::new();
            runner
                .expect_run()
                .withf(move |inv| inv.stdin.as_deref() == Some(DUMP) && downloaded.is_file())
                .times(1)
                .returning(move |_| {
                    Ok(ProcessOutput {
                        stdout_lines: Vec::new(),
                        stderr: if exit_code == 0 { String::new() } else { "ERROR 1064".into() },
                        exit_code,
                    })
                });
            let prompt = MockPrompt::new();
            let pipeline = RestorePipeline {
                runner: &runner,
                prompt: &prompt,
                restore_binary: PathBuf::from("mysql"),
                local: local.clone(),
                cloud: Some(cloud.clone()),
            };

            let options = RestoreOptions {
                from_cloud: true,
                ..yes_options("shop_1.sql")
            };
            let result = pipeline.run(&connection(), &options).await;
            if exit_code == 0 {
                assert_eq!(result?.disk, "s3");
            } else {
                assert!(matches!(result, Err(BackupError::RestoreFailed { ref file, .. }) if file == "shop_1.sql"));
            }

            assert!(!local.has("shop_1.cloud.sql").await?);
            assert!(local.files().await?.is_empty());
            assert!(cloud.has("shop_1.sql").await?);
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_declined_confirmation_aborts_before_restore() -> anyhow::Result<()> {
        let local_dir = tempfile::tempdir()?;
        let local = location(&local_dir, "local");
        local.put("shop_1.sql.gz", &gzip_compress(DUMP)?).await?;

        let runner = idle_runner();
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().times(1).returning(|_| Ok(false));
        let pipeline = RestorePipeline {
            runner: &runner,
            prompt: &prompt,
            restore_binary: PathBuf::from("mysql"),
            local: local.clone(),
            cloud: None,
        };

        let options = RestoreOptions {
            filename: Some("shop_1.sql.gz".into()),
            ..RestoreOptions::default()
        };
        let err = pipeline.run(&connection(), &options).await.unwrap_err();
        assert!(err.is_abort());
        assert_eq!(local.files().await?, vec!["shop_1.sql.gz".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_or_missing_file_aborts_before_confirmation() -> anyhow::Result<()> {
        let local_dir = tempfile::tempdir()?;
        let local = location(&local_dir, "local");
        local.put("shop_1.txt", b"nope").await?;

        let runner = idle_runner();
        let mut prompt = MockPrompt::new();
        prompt.expect_confirm().never();
        let pipeline = RestorePipeline {
            runner: &runner,
            prompt: &prompt,
            restore_binary: PathBuf::from("mysql"),
            local,
            cloud: None,
        };

        let options = RestoreOptions {
            filename: Some("shop_1.txt".into()),
            ..RestoreOptions::default()
        };
        let err = pipeline.run(&connection(), &options).await.unwrap_err();
        assert!(matches!(err, BackupError::InvalidExtension { .. }));

        let options = RestoreOptions {
            filename: Some("shop_9.sql".into()),
            ..RestoreOptions::default()
        };
        let err = pipeline.run(&connection(), &options).await.unwrap_err();
        assert!(matches!(err, BackupError::FileNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_corrupt_archive_is_reported_and_cleaned() -> anyhow::Result<()> {
        let local_dir = tempfile::tempdir()?;
        let cloud_dir = tempfile::tempdir()?;
        let local = location(&local_dir, "local");
        let cloud = location(&cloud_dir, "s3");
        cloud.put("shop_1.sql.gz", b"not gzip at all").await?;

        let runner = idle_runner();
        let prompt = MockPrompt::new();
        let pipeline = RestorePipeline {
            runner: &runner,
            prompt: &prompt,
            restore_binary: PathBuf::from("mysql"),
            local: local.clone(),
            cloud: Some(cloud),
        };

        let options = RestoreOptions {
            filename: Some("shop_1.sql.gz".into()),
            from_cloud: true,
            assume_yes: true,
            ..RestoreOptions::default()
        };
        let err = pipeline.run(&connection(), &options).await.unwrap_err();
        assert!(matches!(err, BackupError::Corrupt { ref file, .. } if file == "shop_1.cloud.sql.gz"));
        assert!(local.files().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_from_cloud_without_cloud_disk() -> anyhow::Result<()> {
        let local_dir = tempfile::tempdir()?;
        let runner = idle_runner();
        let prompt = MockPrompt::new();
        let pipeline = RestorePipeline {
            runner: &runner,
            prompt: &prompt,
            restore_binary: PathBuf::from("mysql"),
            local: location(&local_dir, "local"),
            cloud: None,
        };

        let options = RestoreOptions {
            from_cloud: true,
            ..RestoreOptions::default()
        };
        let err = pipeline.run(&connection(), &options).await.unwrap_err();
        assert!(matches!(err, BackupError::Config(_)));
        Ok(())
    }
}
