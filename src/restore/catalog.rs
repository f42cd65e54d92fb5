//! Listing and selection of existing backup files on a disk.

use crate::backup::naming::{COMPRESSED_SQL_EXTENSION, SQL_EXTENSION};
use crate::errors::{BackupError, Result};
use crate::storage::StorageLocation;
use crate::utils::prompt::Prompt;

/// Which files of a disk are offered.
#[derive(Debug, Clone, Copy)]
pub enum CatalogFilter<'a> {
    /// `.sql` and `.sql.gz` files, limited to names starting with `database`
    /// unless `include_all` is set.
    Restorable { database: &'a str, include_all: bool },
    /// Only `.sql.gz` files, any database.
    Compressed,
}

impl CatalogFilter<'_> {
    pub fn has_valid_extension(&self, filename: &str) -> bool {
        match self {
            CatalogFilter::Restorable { .. } => {
                filename.ends_with(SQL_EXTENSION) || filename.ends_with(COMPRESSED_SQL_EXTENSION)
            }
            CatalogFilter::Compressed => filename.ends_with(COMPRESSED_SQL_EXTENSION),
        }
    }

    fn accepts(&self, filename: &str) -> bool {
        if !self.has_valid_extension(filename) {
            return false;
        }
        match self {
            CatalogFilter::Restorable { database, include_all } => *include_all || filename.starts_with(database),
            CatalogFilter::Compressed => true,
        }
    }
}

/// Backup files on `location` accepted by `filter`, newest first.
///
/// An empty result is reported as [`BackupError::EmptyCatalog`]; storage failures
/// come back as their own errors.
pub async fn list_backup_files(location: &StorageLocation, filter: &CatalogFilter<'_>) -> Result<Vec<String>> {
    let files: Vec<String> = location
        .files()
        .await?
        .into_iter()
        .rev()
        .filter(|name| filter.accepts(name))
        .collect();

    if files.is_empty() {
        return Err(BackupError::EmptyCatalog {
            disk: location.disk().to_string(),
        });
    }
    Ok(files)
}

/// Resolves the file to work on: the explicit name, else the newest catalog
/// entry when `latest` is set, else the operator's choice. The result has a
/// valid extension and exists on `location`.
pub async fn select_backup_file(
    location: &StorageLocation,
    filter: &CatalogFilter<'_>,
    explicit: Option<&str>,
    latest: bool,
    prompt: &dyn Prompt,
    question: &str,
) -> Result<String> {
    let filename = match explicit.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => {
            let files = list_backup_files(location, filter).await?;
            if latest {
                files[0].clone()
            } else {
                prompt.choose(question, &files)?
            }
        }
    };

    if !filter.has_valid_extension(&filename) {
        return Err(BackupError::InvalidExtension { file: filename });
    }
    if !location.has(&filename).await? {
        return Err(BackupError::FileNotFound {
            file: filename,
            disk: location.disk().to_string(),
        });
    }
    Ok(filename)
}
