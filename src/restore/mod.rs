pub(crate) mod catalog;    // listing and selection of backup files
pub(crate) mod db_restore; // mysql invocation and scratch file names
pub(crate) mod logic;      // restore pipeline

pub use logic::RestoreOptions;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::utils::find_executable;
use crate::utils::process::ProcessRunner;
use crate::utils::prompt::Prompt;
use catalog::{CatalogFilter, list_backup_files};
use logic::RestorePipeline;

/// Public entry point for the restore process.
pub async fn run_restore_flow(
    app_config: &AppConfig,
    options: &RestoreOptions,
    database: Option<&str>,
    runner: &dyn ProcessRunner,
    prompt: &dyn Prompt,
) -> Result<()> {
    let connection = app_config.connection(database)?;
    let cloud = if options.from_cloud {
        Some(app_config.cloud_location().await?)
    } else {
        None
    };

    let pipeline = RestorePipeline {
        runner,
        prompt,
        restore_binary: find_executable(&app_config.binaries.restore)?,
        local: app_config.local_location(),
        cloud,
    };

    let report = pipeline.run(&connection, options).await?;
    println!(
        "🎉 Mysql restore of {} completed from '{}' disk file {}",
        report.database, report.disk, report.filename
    );
    Ok(())
}

/// Prints the restore catalog of a disk, newest first.
pub async fn run_list_flow(
    app_config: &AppConfig,
    from_cloud: bool,
    all_backup_files: bool,
    database: Option<&str>,
) -> Result<()> {
    let connection = app_config.connection(database)?;
    let location = if from_cloud {
        app_config.cloud_location().await?
    } else {
        app_config.local_location()
    };

    let filter = CatalogFilter::Restorable {
        database: &connection.database,
        include_all: all_backup_files,
    };
    let files = list_backup_files(&location, &filter).await?;

    println!("📂 Backup files on '{}' disk ({}):", location.disk(), location.prefix);
    for file in &files {
        println!("  {}", file);
    }
    Ok(())
}
