// mysql-backup/src/backup/db_dump.rs
use std::path::Path;

use crate::config::ConnectionSpec;
use crate::utils::process::Invocation;

/// Consistent snapshot without locking, streaming rows instead of buffering tables.
pub const SAFETY_FLAGS: [&str; 3] = ["--single-transaction", "--skip-lock-tables", "--quick"];

/// Builds the `mysqldump` call for a database, or a single table of it.
pub fn dump_invocation(dump_binary: &Path, connection: &ConnectionSpec, table: Option<&str>) -> Invocation {
    let mut invocation = Invocation::new(dump_binary);
    for arg in connection.client_args() {
        invocation = invocation.arg(arg);
    }
    for flag in SAFETY_FLAGS {
        invocation = invocation.arg(flag);
    }
    invocation = invocation.arg(connection.database.clone());
    if let Some(table) = table.filter(|t| !t.is_empty()) {
        invocation = invocation.arg(table);
    }
    invocation
}
