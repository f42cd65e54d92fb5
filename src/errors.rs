use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Dump of database '{database}' failed with exit code {exit_code}: {stderr}")]
    DumpFailed {
        database: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Restore of database '{database}' from '{disk}' disk file '{file}' failed with exit code {exit_code}: {stderr}")]
    RestoreFailed {
        database: String,
        disk: String,
        file: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("File '{file}' is not a valid backup file!")]
    InvalidExtension { file: String },

    #[error("File '{file}' does not exist on '{disk}' disk!")]
    FileNotFound { file: String, disk: String },

    #[error("There are no backup files on '{disk}' disk!")]
    EmptyCatalog { disk: String },

    #[error("Operation cancelled")]
    Aborted,

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("File '{file}' could not be decoded: {source}")]
    Corrupt {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl BackupError {
    /// Bad extension, missing file or empty catalog.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            BackupError::InvalidExtension { .. }
                | BackupError::FileNotFound { .. }
                | BackupError::EmptyCatalog { .. }
        )
    }

    pub fn is_abort(&self) -> bool {
        matches!(self, BackupError::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, BackupError>;
