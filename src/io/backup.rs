use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use serde::Serialize;
use tracing::debug;

use crate::io::catalog_io::{PersistenceError, parse_catalog};
use crate::io::recovery::atomic_write;
use crate::model::Catalog;

/// A backup file found on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackupInfo {
    pub path: PathBuf,
    pub created: DateTime<Utc>,
}

fn write_error(path: &Path, source: std::io::Error) -> PersistenceError {
    PersistenceError::Write {
        target: path.display().to_string(),
        source,
    }
}

/// Write `backup_<millis>.json` into `dir`: the catalog document plus a
/// `backupDate` field.
pub fn create_backup(dir: &Path, catalog: &Catalog) -> Result<PathBuf, PersistenceError> {
    std::fs::create_dir_all(dir).map_err(|e| write_error(dir, e))?;
    let now = Utc::now();
    let mut millis = now.timestamp_millis();
    let mut path = dir.join(format!("backup_{}.json", millis));
    while path.exists() {
        millis += 1;
        path = dir.join(format!("backup_{}.json", millis));
    }

    let mut doc = serde_json::to_value(catalog)?;
    if let Some(obj) = doc.as_object_mut() {
        obj.insert(
            "backupDate".to_string(),
            serde_json::Value::String(now.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
    }
    let text = serde_json::to_string_pretty(&doc)?;
    atomic_write(&path, text.as_bytes()).map_err(|e| write_error(&path, e))?;
    debug!(path = %path.display(), "backup created");
    Ok(path)
}

/// Backups in `dir`, newest first. A missing directory has none.
pub fn list_backups(dir: &Path) -> Result<Vec<BackupInfo>, PersistenceError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(PersistenceError::Read {
                path: dir.to_path_buf(),
                source: e,
            });
        }
    };

    let mut backups: Vec<BackupInfo> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let path = entry.path();
            let name = path.file_name()?.to_str()?;
            let millis: i64 = name.strip_prefix("backup_")?.strip_suffix(".json")?.parse().ok()?;
            let created = Utc.timestamp_millis_opt(millis).single()?;
            Some(BackupInfo { path, created })
        })
        .collect();
    backups.sort_by(|a, b| b.created.cmp(&a.created));
    Ok(backups)
}

/// Read a backup back into a catalog. `backupDate` is ignored.
pub fn restore_backup(path: &Path) -> Result<Catalog, PersistenceError> {
    let text = std::fs::read_to_string(path).map_err(|e| PersistenceError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_catalog(&text)
}
