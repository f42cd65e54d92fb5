use chrono::NaiveDateTime;
use std::path::PathBuf;

use crate::backup::compression::gzip_compress;
use crate::backup::db_dump::dump_invocation;
use crate::backup::naming::derive_filename;
use crate::config::ConnectionSpec;
use crate::errors::{BackupError, Result};
use crate::storage::StorageLocation;
use crate::utils::process::ProcessRunner;

#[cfg(windows)]
const LINE_ENDING: &str = "\r\n";
#[cfg(not(windows))]
const LINE_ENDING: &str = "\n";

/// Everything needed to take one dump.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupJob {
    pub connection: ConnectionSpec,
    pub table: Option<String>,
    pub compress: bool,
    pub filename: String,
}

impl BackupJob {
    pub fn new(
        connection: ConnectionSpec,
        user_filename: Option<&str>,
        table: Option<String>,
        compress: bool,
        now: NaiveDateTime,
    ) -> Self {
        let table = table.filter(|t| !t.trim().is_empty());
        let filename = derive_filename(user_filename, &connection.database, table.as_deref(), compress, now);
        Self {
            connection,
            table,
            compress,
            filename,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport {
    pub filename: String,
    pub bytes: usize,
    pub kept_local: bool,
    pub synced_to_cloud: bool,
}

pub struct DumpPipeline<'a> {
    pub runner: &'a dyn ProcessRunner,
    pub dump_binary: PathBuf,
    pub local: StorageLocation,
    /// Set when every dump is also uploaded to the cloud disk.
    pub cloud: Option<StorageLocation>,
    pub keep_local: bool,
}

impl DumpPipeline<'_> {
    /// Dumps, optionally compresses, then stores the payload.
    ///
    /// Nothing is written when the dump process fails.
    pub async fn run(&self, job: &BackupJob) -> Result<DumpReport> {
        let database = &job.connection.database;
        println!("🔍 Dumping database: {}", database);

        let invocation = dump_invocation(&self.dump_binary, &job.connection, job.table.as_deref());
        let output = self.runner.run(&invocation)?;
        if !output.success() {
            return Err(BackupError::DumpFailed {
                database: database.clone(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        let mut payload = output.stdout_lines.join(LINE_ENDING.as_bytes());
        if job.compress {
            payload = gzip_compress(&payload)?;
        }

        self.local.put(&job.filename, &payload).await?;
        println!(
            "✅ Backup of {} stored on '{}' disk as {}",
            database,
            self.local.disk(),
            self.local.file_path(&job.filename)
        );

        let mut kept_local = true;
        let synced_to_cloud = match &self.cloud {
            Some(cloud) => {
                cloud.put(&job.filename, &payload).await?;
                println!(
                    "✅ Backup uploaded to '{}' disk as {}",
                    cloud.disk(),
                    cloud.file_path(&job.filename)
                );
                if !self.keep_local {
                    self.local.delete(&job.filename).await?;
                    kept_local = false;
                    println!("🗑 Local copy {} removed", job.filename);
                }
                true
            }
            None => false,
        };

        Ok(DumpReport {
            filename: job.filename.clone(),
            bytes: payload.len(),
            kept_local,
            synced_to_cloud,
        })
    }
}
