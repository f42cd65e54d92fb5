use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::backup::DumpOptions;
use crate::fix::FixOptions;
use crate::restore::RestoreOptions;

/// backup: dump and restore MySQL databases, locally and to S3-compatible storage
#[derive(Parser, Debug)]
#[command(name = "backup", version, about = "Dump and restore MySQL databases with optional compression and cloud sync.", long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Path to the JSON configuration (defaults to $BACKUP_CONFIG or ./backup.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Dump a database to a backup file
    Dump(DumpArgs),

    /// Restore a database from a backup file
    Restore(RestoreArgs),

    /// Re-encode a legacy zlib backup file as gzip, written as fix_<filename>
    FixFile(FixFileArgs),

    /// List the backup files available for restore
    List(ListArgs),
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    /// Backup file name, without extension (defaults to <database>[_<table>]_<timestamp>)
    pub filename: Option<String>,

    /// Dump a single table
    #[arg(short = 't', long)]
    pub table: Option<String>,

    /// Gzip the dump
    #[arg(long, conflicts_with = "no_compress")]
    pub compress: bool,

    /// Store the dump as plain SQL
    #[arg(long)]
    pub no_compress: bool,

    /// Named connection to dump
    #[arg(short = 'd', long)]
    pub database: Option<String>,
}

impl DumpArgs {
    pub fn options(&self) -> DumpOptions {
        let compress = match (self.compress, self.no_compress) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        DumpOptions {
            filename: self.filename.clone(),
            table: self.table.clone(),
            compress,
            database: self.database.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Restore a specific backup file
    #[arg(short = 'f', long)]
    pub filename: Option<String>,

    /// Offer backup files of every database, not only the active one
    #[arg(short = 'a', long)]
    pub all_backup_files: bool,

    /// Restore from the cloud disk
    #[arg(short = 'C', long)]
    pub from_cloud: bool,

    /// Restore the newest backup file without asking
    #[arg(short = 'l', long)]
    pub restore_latest_backup: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Named connection to restore into
    #[arg(short = 'd', long)]
    pub database: Option<String>,
}

impl RestoreArgs {
    pub fn options(&self) -> RestoreOptions {
        RestoreOptions {
            filename: self.filename.clone(),
            all_backup_files: self.all_backup_files,
            from_cloud: self.from_cloud,
            latest: self.restore_latest_backup,
            assume_yes: self.yes,
        }
    }
}

#[derive(Args, Debug)]
pub struct FixFileArgs {
    /// Fix a specific backup file
    #[arg(short = 'f', long)]
    pub filename: Option<String>,

    /// Pick the file from the cloud disk
    #[arg(short = 'C', long)]
    pub from_cloud: bool,

    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl FixFileArgs {
    pub fn options(&self) -> FixOptions {
        FixOptions {
            filename: self.filename.clone(),
            from_cloud: self.from_cloud,
            assume_yes: self.yes,
        }
    }
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// List the cloud disk
    #[arg(short = 'C', long)]
    pub from_cloud: bool,

    /// Include backup files of every database
    #[arg(short = 'a', long)]
    pub all_backup_files: bool,

    /// Named connection whose backups are listed
    #[arg(short = 'd', long)]
    pub database: Option<String>,
}
