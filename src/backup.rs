//! Pre-write backup copies.
//!
//! Before any destructive write the target file is copied to a sibling named
//! `<path>.backup.<YYYYmmdd_HHMMSS>`. Retention is bounded per file when
//! `max_backups > 0`: the oldest copies are deleted first. Cleanup problems
//! never fail the mutation that triggered them.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::config::JournalConfig;
use crate::error::{JournalError, Result};

/// Copies `path` aside if backups are enabled, returning the backup path.
pub fn create_backup(path: &Path, config: &JournalConfig) -> Result<Option<PathBuf>> {
    if !config.create_backups {
        return Ok(None);
    }
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".backup.{}", stamp));
    let backup = PathBuf::from(name);
    fs::copy(path, &backup).map_err(|e| JournalError::io(path, e))?;
    debug!(backup = %backup.display(), "created backup");
    cleanup_old_backups(path, config.max_backups);
    Ok(Some(backup))
}

/// Deletes the oldest backups of `path` until at most `max` remain.
fn cleanup_old_backups(path: &Path, max: usize) {
    if max == 0 {
        return;
    }
    let mut backups = match list_backups(path) {
        Ok(backups) => backups,
        Err(err) => {
            warn!(file = %path.display(), error = %err, "cannot list backups for cleanup");
            return;
        }
    };
    if backups.len() <= max {
        return;
    }
    backups.sort_by(|a, b| (a.1, &a.0).cmp(&(b.1, &b.0)));
    for (old, _) in backups.iter().take(backups.len() - max) {
        if let Err(err) = fs::remove_file(old) {
            warn!(backup = %old.display(), error = %err, "cannot delete old backup");
        }
    }
}

/// All backups of `path` in its directory, with modification times.
pub(crate) fn list_backups(path: &Path) -> std::io::Result<Vec<(PathBuf, SystemTime)>> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let prefix = format!("{}.backup.", file_name);
    let mut backups = Vec::new();
    for entry in fs::read_dir(parent)? {
        let entry = entry?;
        if entry.file_name().to_string_lossy().starts_with(&prefix) {
            let mtime = entry
                .metadata()?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            backups.push((entry.path(), mtime));
        }
    }
    Ok(backups)
}
