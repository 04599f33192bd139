//! Whole-document JSON file helpers shared by every store.
//!
//! Writes go to a sibling temp file that is then renamed over the target, so
//! a reader never observes a half-written document.

use crate::domain::errors::StoreError;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Read and parse a JSON document. `Ok(None)` when the file does not exist.
pub fn read_json(path: &Path) -> Result<Option<Value>, StoreError> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if content.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

fn temp_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!("{}.tmp", file_name))
}

/// Replace the whole document atomically (write temp, then rename).
pub fn write_json_atomic(path: &Path, value: &Value) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        fs::create_dir_all(parent).map_err(io_err)?;
    }

    let mut content = serde_json::to_string_pretty(value).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    content.push('\n');

    let temp = temp_path(path);
    fs::write(&temp, content).map_err(io_err)?;
    fs::rename(&temp, path).map_err(io_err)?;
    Ok(())
}

/// Move an unreadable document aside so it is never overwritten.
///
/// Returns the new location, `<name>.corrupt-<UTC timestamp>`.
pub fn quarantine(path: &Path) -> Result<PathBuf, StoreError> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    let aside = path.with_file_name(format!(
        "{}.corrupt-{}",
        file_name,
        Utc::now().format("%Y%m%dT%H%M%S%.3fZ")
    ));
    fs::rename(path, &aside).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(aside)
}
