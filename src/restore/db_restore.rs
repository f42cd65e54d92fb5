// mysql-backup/src/restore/db_restore.rs
use std::path::Path;

use crate::backup::naming::{COMPRESSED_SQL_EXTENSION, SQL_EXTENSION};
use crate::config::ConnectionSpec;
use crate::utils::process::Invocation;

const CLOUD_MARKER: &str = ".cloud";
const TEMP_EXTENSION: &str = ".tmp";

/// Builds the `mysql` call that replays `dump` into the connection's database.
pub fn restore_invocation(restore_binary: &Path, connection: &ConnectionSpec, dump: Vec<u8>) -> Invocation {
    let mut invocation = Invocation::new(restore_binary);
    for arg in connection.client_args() {
        invocation = invocation.arg(arg);
    }
    invocation.arg(connection.database.clone()).stdin(dump)
}

/// Local name for a file fetched from the cloud disk, so it never collides
/// with a local backup of the same name.
pub fn cloud_local_name(filename: &str) -> String {
    if let Some(base) = filename.strip_suffix(COMPRESSED_SQL_EXTENSION) {
        format!("{}{}{}", base, CLOUD_MARKER, COMPRESSED_SQL_EXTENSION)
    } else if let Some(base) = filename.strip_suffix(SQL_EXTENSION) {
        format!("{}{}{}", base, CLOUD_MARKER, SQL_EXTENSION)
    } else {
        format!("{}{}", filename, CLOUD_MARKER)
    }
}

/// Name of the decompressed scratch copy of a `.sql.gz` file.
pub fn decompressed_name(filename: &str) -> String {
    match filename.strip_suffix(COMPRESSED_SQL_EXTENSION) {
        Some(base) => format!("{}{}", base, TEMP_EXTENSION),
        None => format!("{}{}", filename, TEMP_EXTENSION),
    }
}
