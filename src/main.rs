//! MySQL Backup/Restore Tool
//!
//! Provides CLI interface for dumping, restoring and repairing MySQL backups

// mysql-backup/src/main.rs
mod backup;
mod cli;
mod config;
mod errors;
mod fix;
mod restore;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use config::{AppConfig, DEFAULT_CONFIG_PATH};
use errors::BackupError;
use utils::process::SystemProcessRunner;
use utils::prompt::ConsolePrompt;

/// Main entry point for the backup tool
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run_app(cli).await {
        Ok(_) => {
            println!("✅ Operation completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => match e.downcast_ref::<BackupError>() {
            // Declining a prompt is the operator's decision, not a failure.
            Some(err) if err.is_abort() => {
                println!("🛑 {}", err);
                ExitCode::SUCCESS
            }
            Some(err) if err.is_validation() => {
                eprintln!("❌ {}", err);
                ExitCode::FAILURE
            }
            _ => {
                eprintln!("❌ Error: {:?}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    cli.config
        .clone()
        .or_else(|| env::var("BACKUP_CONFIG").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

async fn run_app(cli: Cli) -> Result<()> {
    let config_path = config_path(&cli);
    let app_config = AppConfig::load_from_json(&config_path)
        .context(format!("Failed to load application configuration from {}", config_path.display()))?;

    let runner = SystemProcessRunner;
    let prompt = ConsolePrompt;

    match &cli.command {
        Commands::Dump(args) => {
            println!("🚀 Starting Dump Process...");
            backup::run_dump_flow(&app_config, &args.options(), &runner).await?;
        }
        Commands::Restore(args) => {
            println!("🔄 Starting Restore Process...");
            restore::run_restore_flow(
                &app_config,
                &args.options(),
                args.database.as_deref(),
                &runner,
                &prompt,
            )
            .await?;
        }
        Commands::FixFile(args) => {
            println!("🛠 Starting File Encoding Fix...");
            fix::run_fix_flow(&app_config, &args.options(), &prompt).await?;
        }
        Commands::List(args) => {
            restore::run_list_flow(
                &app_config,
                args.from_cloud,
                args.all_backup_files,
                args.database.as_deref(),
            )
            .await?;
        }
    }
    Ok(())
}
