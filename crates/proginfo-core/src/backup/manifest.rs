//! Backup manifest entries.

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One backup listed in a source's manifest file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackupManifestEntry {
    pub id: Uuid,
    pub source_key: String,
    /// Number of records in the data file.
    pub program_amount: usize,
    /// Local time the backup was taken.
    pub backup_date: NaiveDateTime,
    /// Data file name, relative to the backup folder.
    pub file_name: String,
}

impl BackupManifestEntry {
    /// New entry with a fresh id, stamped with the current local time.
    pub fn new(source_key: impl Into<String>, program_amount: usize, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            source_key: source_key.into(),
            program_amount,
            backup_date: Local::now().naive_local(),
            file_name: file_name.into(),
        }
    }
}

/// Most recent entry for `source_key`.
pub fn latest_entry<'a>(
    entries: &'a [BackupManifestEntry],
    source_key: &str,
) -> Option<&'a BackupManifestEntry> {
    entries
        .iter()
        .filter(|entry| entry.source_key == source_key)
        .max_by_key(|entry| entry.backup_date)
}
