use chrono::NaiveDateTime;

pub const SQL_EXTENSION: &str = ".sql";
pub const GZIP_EXTENSION: &str = ".gz";
pub const COMPRESSED_SQL_EXTENSION: &str = ".sql.gz";

const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Computes the backup file name for a dump.
///
/// A user supplied name is trimmed and cut at its first `.`; otherwise the name is
/// `{database}[_{table}]_{YYYYMMDDHHMMSS}`. `.sql` is always appended, then `.gz`
/// when compressing.
pub fn derive_filename(
    user_supplied: Option<&str>,
    database: &str,
    table: Option<&str>,
    compress: bool,
    now: NaiveDateTime,
) -> String {
    let base = match user_supplied.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.split('.').next().unwrap_or(name).to_string(),
        None => {
            let mut base = database.to_string();
            if let Some(table) = table.filter(|t| !t.is_empty()) {
                base.push('_');
                base.push_str(table);
            }
            base.push('_');
            base.push_str(&now.format(TIMESTAMP_FORMAT).to_string());
            base
        }
    };

    let mut filename = base;
    filename.push_str(SQL_EXTENSION);
    if compress {
        filename.push_str(GZIP_EXTENSION);
    }
    filename
}
