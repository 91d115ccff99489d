//! Suffix-qualified backup copies written before a file is overwritten

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Where the backup for `path` lives: the original path with the suffix
/// appended (`schema.sql` -> `schema.sql.bak`)
pub fn backup_path(path: &Path, suffix: &str) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(suffix);
    PathBuf::from(os)
}

/// Write the original content next to the file before it is overwritten
pub fn write_backup(path: &Path, content: &str, suffix: &str) -> io::Result<PathBuf> {
    let target = backup_path(path, suffix);
    fs::write(&target, content)?;
    Ok(target)
}
