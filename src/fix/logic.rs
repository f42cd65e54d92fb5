// mysql-backup/src/fix/logic.rs
use crate::backup::compression::{gzip_compress, zlib_decompress};
use crate::errors::{BackupError, Result};
use crate::restore::catalog::{CatalogFilter, select_backup_file};
use crate::storage::StorageLocation;
use crate::utils::prompt::{Prompt, confirm_or_abort};

pub const FIXED_PREFIX: &str = "fix_";

/// Options of `backup fix-file`.
#[derive(Debug, Clone, Default)]
pub struct FixOptions {
    pub filename: Option<String>,
    pub from_cloud: bool,
    pub assume_yes: bool,
}

/// Re-encodes zlib-wrapped `.sql.gz` files written by older releases as gzip.
pub struct FixFilePipeline<'a> {
    pub prompt: &'a dyn Prompt,
    pub location: StorageLocation,
}

impl FixFilePipeline<'_> {
    /// Writes `fix_{filename}` next to the original and returns its name.
    /// The original file is left untouched.
    pub async fn run(&self, options: &FixOptions) -> Result<String> {
        let question = format!(
            "Which database backup file do you want to fix encoding from '{}' disk?",
            self.location.disk()
        );
        let filename = select_backup_file(
            &self.location,
            &CatalogFilter::Compressed,
            options.filename.as_deref(),
            false,
            self.prompt,
            &question,
        )
        .await?;

        confirm_or_abort(
            self.prompt,
            options.assume_yes,
            "Are you sure that you want to fix the file encoding?",
        )?;

        let legacy = self.location.get(&filename).await?;
        let payload = zlib_decompress(&legacy).map_err(|e| BackupError::Corrupt {
            file: filename.clone(),
            source: e,
        })?;
        let fixed = gzip_compress(&payload)?;

        let fixed_name = format!("{}{}", FIXED_PREFIX, filename);
        self.location.put(&fixed_name, &fixed).await?;

        println!(
            "✅ File '{}' fixed successfully from '{}' disk as '{}'",
            filename,
            self.location.disk(),
            fixed_name
        );
        Ok(fixed_name)
    }
}
