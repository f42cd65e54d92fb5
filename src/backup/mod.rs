pub(crate) mod compression; // gzip/zlib codec for dump payloads
pub(crate) mod db_dump;     // mysqldump invocation
pub(crate) mod logic;       // dump pipeline
pub(crate) mod naming;      // backup file names

use chrono::Local;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::utils::find_executable;
use crate::utils::process::ProcessRunner;
use logic::{BackupJob, DumpPipeline};

/// Options of `backup dump`.
#[derive(Debug, Clone, Default)]
pub struct DumpOptions {
    pub filename: Option<String>,
    pub table: Option<String>,
    /// `None` uses the configured default.
    pub compress: Option<bool>,
    pub database: Option<String>,
}

/// Public entry point for the dump process.
pub async fn run_dump_flow(
    app_config: &AppConfig,
    options: &DumpOptions,
    runner: &dyn ProcessRunner,
) -> Result<()> {
    let connection = app_config.connection(options.database.as_deref())?;
    let compress = options.compress.unwrap_or(app_config.compress);
    let job = BackupJob::new(
        connection,
        options.filename.as_deref(),
        options.table.clone(),
        compress,
        Local::now().naive_local(),
    );

    let cloud = if app_config.cloud_storage.sync_enabled {
        Some(app_config.cloud_location().await?)
    } else {
        None
    };

    let pipeline = DumpPipeline {
        runner,
        dump_binary: find_executable(&app_config.binaries.dump)?,
        local: app_config.local_location(),
        cloud,
        keep_local: app_config.cloud_storage.keep_local,
    };

    let report = pipeline.run(&job).await?;
    println!(
        "🎉 Mysql backup of {} completed! {} ({} bytes, local copy {}, cloud sync {})",
        job.connection.database,
        report.filename,
        report.bytes,
        if report.kept_local { "kept" } else { "removed" },
        if report.synced_to_cloud { "done" } else { "off" }
    );
    Ok(())
}
