//! Atomic file operations for safe JSON persistence.
//!
//! Writes go to a temporary file in the target directory, are synced, then
//! renamed over the target so readers never observe a partial file.

use crate::error::{ProgInfoError, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Read and parse a JSON file.
///
/// Returns `None` if the file doesn't exist, or an error if parsing fails.
pub fn atomic_read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(path).map_err(|e| ProgInfoError::Io {
        message: format!("Failed to read {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e),
    })?;

    let data: T = serde_json::from_str(&contents).map_err(|e| ProgInfoError::Json {
        message: format!("Failed to parse {}: {}", path.display(), e),
        source: Some(e),
    })?;

    Ok(Some(data))
}

/// Write data to a JSON file atomically, creating parent directories.
pub fn atomic_write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| ProgInfoError::Io {
        message: format!("Failed to create directory {}", parent.display()),
        path: Some(parent.to_path_buf()),
        source: Some(e),
    })?;

    let serialized = serde_json::to_string_pretty(data).map_err(|e| ProgInfoError::Json {
        message: format!("Failed to serialize data: {}", e),
        source: Some(e),
    })?;

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| ProgInfoError::Io {
        message: format!("Failed to create temp file in {}", parent.display()),
        path: Some(parent.to_path_buf()),
        source: Some(e),
    })?;

    if let Err(e) = write_and_sync(&mut temp, serialized.as_bytes()) {
        return Err(ProgInfoError::Io {
            message: format!("Failed to write temp file {}", temp.path().display()),
            path: Some(temp.path().to_path_buf()),
            source: Some(e),
        });
    }

    temp.persist(path).map_err(|e| ProgInfoError::Io {
        message: format!("Failed to rename temp file to {}", path.display()),
        path: Some(path.to_path_buf()),
        source: Some(e.error),
    })?;

    debug!("Atomically wrote {}", path.display());
    Ok(())
}

fn write_and_sync(temp: &mut NamedTempFile, bytes: &[u8]) -> std::io::Result<()> {
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()
}
