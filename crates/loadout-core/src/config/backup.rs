//! Pre-write file backups

use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, ConfigResult};

/// Copy the pre-mutation content of `path` into `backup_dir` before any
/// write touches the target
///
/// Returns the backup id, or `None` when the target does not exist yet
/// (nothing to back up).
pub fn create_backup(path: &Path, backup_dir: &Path) -> ConfigResult<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    fs::create_dir_all(backup_dir).map_err(|e| ConfigError::io(backup_dir, &e))?;

    let backup_id = uuid::Uuid::new_v4().to_string();
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let file_name = path
        .file_name()
        .map_or_else(|| "config".to_string(), |n| n.to_string_lossy().to_string());
    let backup_name = format!("{}_{}.{}.bak", file_name, timestamp, &backup_id[..8]);
    let backup_path = backup_dir.join(&backup_name);

    fs::copy(path, &backup_path).map_err(|e| {
        ConfigError::BackupFailed(format!("failed to back up {}: {e}", path.display()))
    })?;

    Ok(Some(backup_id))
}

/// List backup files for a given original file name, newest first
pub fn list_backups(backup_dir: &Path, file_name: &str) -> ConfigResult<Vec<PathBuf>> {
    if !backup_dir.exists() {
        return Ok(Vec::new());
    }

    let prefix = format!("{file_name}_");
    let mut backups: Vec<PathBuf> = fs::read_dir(backup_dir)
        .map_err(|e| ConfigError::io(backup_dir, &e))?
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(".bak"))
        })
        .collect();

    backups.sort();
    backups.reverse();
    Ok(backups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backup_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let result = create_backup(&dir.path().join("absent.json"), &dir.path().join("backups"));
        assert_eq!(result.unwrap(), None);
    }

    #[test]
    fn test_backup_copies_content() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("settings.json");
        fs::write(&target, r#"{"a": 1}"#).unwrap();

        let backup_dir = dir.path().join("backups");
        let id = create_backup(&target, &backup_dir).unwrap();
        assert!(id.is_some());

        let backups = list_backups(&backup_dir, "settings.json").unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(&backups[0]).unwrap(), r#"{"a": 1}"#);
    }
}
