pub mod process;
pub mod prompt;

use std::path::PathBuf;
use which::which;

use crate::errors::{BackupError, Result};

/// Separator used for every storage path, local or cloud.
pub const PATH_SEPARATOR: char = '/';

/// Strips leading and trailing separators from a storage path.
pub fn clean_path(path: &str) -> &str {
    path.trim_matches(PATH_SEPARATOR)
}

/// Joins a storage directory and a file name.
///
/// An empty directory yields `/file`; storage backends strip the leading separator.
pub fn join_path(dir: &str, file: &str) -> String {
    format!("{}{}{}", clean_path(dir), PATH_SEPARATOR, file)
}

/// Finds a client executable (e.g. `mysqldump`) in the system PATH.
pub fn find_executable(binary: &str) -> Result<PathBuf> {
    which(binary).map_err(|_| {
        BackupError::Config(format!(
            "{} executable not found in PATH. Please ensure MySQL client tools are installed and in your PATH.",
            binary
        ))
    })
}
