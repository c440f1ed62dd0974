//! JSON snapshots of program records and their replay into the store.
//!
//! A backup folder holds, per source key, one manifest file
//! (`<base>.json`) and one data file per snapshot
//! (`<base>_<yyyy-MM-dd_HH-mm-ss>.json`).

use super::atomic::{atomic_read_json, atomic_write_json};
use super::manifest::{latest_entry, BackupManifestEntry};
use crate::config::BackupConfig;
use crate::error::{ProgInfoError, Result};
use crate::naming::backup_base_name;
use crate::programs::ProgramRecord;
use crate::serializer::RegistrySerializer;
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Creates, lists, deletes and restores backups for one source key.
#[derive(Debug, Clone)]
pub struct BackupService {
    serializer: RegistrySerializer,
    source_key: String,
}

impl BackupService {
    pub fn new(serializer: RegistrySerializer) -> Self {
        Self {
            serializer,
            source_key: BackupConfig::SOURCE_KEY_NAME.to_string(),
        }
    }

    /// Service for records tagged with a different source key.
    pub fn with_source_key(mut self, source_key: impl Into<String>) -> Self {
        self.source_key = source_key.into();
        self
    }

    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Path of this source's manifest inside `folder`.
    pub fn manifest_path(&self, folder: &Path) -> PathBuf {
        folder.join(format!(
            "{}.{}",
            backup_base_name(&self.source_key),
            BackupConfig::FILE_EXTENSION
        ))
    }

    /// Write the records belonging to this source into a new snapshot and
    /// list it in the manifest.
    pub fn create_backup(&self, records: &[ProgramRecord], folder: &Path) -> bool {
        match self.try_create_backup(records, folder) {
            Ok(entry) => {
                info!(
                    "Backed up {} programs to {}",
                    entry.program_amount, entry.file_name
                );
                true
            }
            Err(e) => {
                warn!("Failed to create backup in {}: {}", folder.display(), e);
                false
            }
        }
    }

    /// Manifest entries of this source, oldest first.
    pub fn backup_infos(&self, folder: &Path) -> Vec<BackupManifestEntry> {
        match self.read_manifest(folder) {
            Ok(mut entries) => {
                entries.retain(|entry| entry.source_key == self.source_key);
                entries.sort_by_key(|entry| entry.backup_date);
                entries
            }
            Err(e) => {
                warn!("Failed to read backup manifest in {}: {}", folder.display(), e);
                Vec::new()
            }
        }
    }

    /// Remove the entry `id` from the manifest and delete its data file.
    pub fn delete_backup(&self, folder: &Path, id: Uuid) -> bool {
        match self.try_delete_backup(folder, id) {
            Ok(()) => {
                info!("Deleted backup {}", id);
                true
            }
            Err(e) => {
                warn!("Failed to delete backup {}: {}", id, e);
                false
            }
        }
    }

    /// Records stored in the snapshot of `entry`.
    pub fn read_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> Option<Vec<ProgramRecord>> {
        match self.try_read_backup(folder, entry) {
            Ok(records) => Some(records),
            Err(e) => {
                warn!("Failed to read backup {}: {}", entry.file_name, e);
                None
            }
        }
    }

    /// Write every record of `entry`'s snapshot back to its registry key.
    pub fn restore_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> bool {
        match self.try_restore_backup(folder, entry) {
            Ok(restored) => {
                info!("Restored {} programs from {}", restored, entry.file_name);
                true
            }
            Err(e) => {
                warn!("Failed to restore backup {}: {}", entry.file_name, e);
                false
            }
        }
    }

    /// Restore the newest backup of this source. `false` when there is none.
    pub fn restore_latest_backup(&self, folder: &Path) -> bool {
        let entries = self.backup_infos(folder);
        match latest_entry(&entries, &self.source_key) {
            Some(entry) => self.restore_backup(folder, entry),
            None => {
                warn!("No backup of {} in {}", self.source_key, folder.display());
                false
            }
        }
    }

    fn try_create_backup(&self, records: &[ProgramRecord], folder: &Path) -> Result<BackupManifestEntry> {
        let owned: Vec<&ProgramRecord> = records
            .iter()
            .filter(|record| record.source_key == self.source_key)
            .collect();

        let mut manifest = self.read_manifest(folder)?;
        let file_name = self.next_file_name(folder);
        let data_path = folder.join(&file_name);
        atomic_write_json(&data_path, &owned)?;

        let entry = BackupManifestEntry::new(self.source_key.clone(), owned.len(), file_name);
        manifest.push(entry.clone());
        discard_on_error(&data_path, atomic_write_json(&self.manifest_path(folder), &manifest))?;
        Ok(entry)
    }

    fn try_delete_backup(&self, folder: &Path, id: Uuid) -> Result<()> {
        let mut manifest = self.read_manifest(folder)?;
        let position = manifest
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| ProgInfoError::NotFound {
                resource: format!("backup {}", id),
            })?;
        let entry = manifest.remove(position);
        atomic_write_json(&self.manifest_path(folder), &manifest)?;

        let data_path = folder.join(&entry.file_name);
        match fs::remove_file(&data_path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Data file {} already gone", data_path.display());
            }
            Err(e) => return Err(ProgInfoError::io_with_path(e, data_path)),
        }
        Ok(())
    }

    fn try_read_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> Result<Vec<ProgramRecord>> {
        let data_path = folder.join(&entry.file_name);
        atomic_read_json(&data_path)?.ok_or_else(|| ProgInfoError::NotFound {
            resource: data_path.display().to_string(),
        })
    }

    fn try_restore_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> Result<usize> {
        let records = self.try_read_backup(folder, entry)?;
        let mut restored = 0;
        for record in records.iter().filter(|record| record.source_key == self.source_key) {
            if record.reg_key.is_empty() {
                return Err(ProgInfoError::Backup {
                    message: format!("record {:?} has no registry key", record.id),
                });
            }
            let written = self.serializer.serialize(record, &record.reg_key)?;
            debug!("Restored {} values to {}", written, record.reg_key);
            restored += 1;
        }
        Ok(restored)
    }

    fn read_manifest(&self, folder: &Path) -> Result<Vec<BackupManifestEntry>> {
        Ok(atomic_read_json(&self.manifest_path(folder))?.unwrap_or_default())
    }

    /// Timestamped data file name, suffixed when a snapshot of the same
    /// second already exists.
    fn next_file_name(&self, folder: &Path) -> String {
        let stem = format!(
            "{}_{}",
            backup_base_name(&self.source_key),
            Local::now().format(BackupConfig::TIMESTAMP_FORMAT)
        );
        let mut file_name = format!("{}.{}", stem, BackupConfig::FILE_EXTENSION);
        let mut counter = 1;
        while folder.join(&file_name).exists() {
            counter += 1;
            file_name = format!("{}_{}.{}", stem, counter, BackupConfig::FILE_EXTENSION);
        }
        file_name
    }
}

/// Remove a data file whose manifest update failed, so no snapshot is left
/// unreferenced.
fn discard_on_error(data_path: &Path, result: Result<()>) -> Result<()> {
    if result.is_err() {
        if let Err(e) = fs::remove_file(data_path) {
            warn!("Failed to remove orphaned backup {}: {}", data_path.display(), e);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{KeyValueStore, MemoryStore, RegValue};
    use std::sync::Arc;
    use tempfile::TempDir;

    const KEY: &str = r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall\Editor";

    fn service() -> (BackupService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let serializer = RegistrySerializer::new(store.clone());
        (BackupService::new(serializer), store)
    }

    fn editor() -> ProgramRecord {
        ProgramRecord {
            id: "Editor".into(),
            display_name: Some("Editor".into()),
            publisher: Some("ACME".into()),
            estimated_size: 4_096_000,
            version_major: 2,
            no_modify: true,
            reg_key: KEY.into(),
            ..ProgramRecord::default()
        }
    }

    #[test]
    fn test_create_backup_writes_data_and_manifest() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        let foreign = ProgramRecord {
            source_key: "Other".into(),
            ..editor()
        };

        assert!(service.create_backup(&[editor(), foreign], temp.path()));

        let infos = service.backup_infos(temp.path());
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].program_amount, 1);
        assert!(infos[0].file_name.starts_with("Windows-Registry_"));
        assert!(temp.path().join(&infos[0].file_name).exists());
        assert!(temp.path().join("Windows-Registry.json").exists());

        let records = service.read_backup(temp.path(), &infos[0]).unwrap();
        assert_eq!(records, vec![editor()]);
    }

    #[test]
    fn test_backups_in_same_second_do_not_collide() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        assert!(service.create_backup(&[editor()], temp.path()));
        assert!(service.create_backup(&[], temp.path()));

        let infos = service.backup_infos(temp.path());
        assert_eq!(infos.len(), 2);
        assert_ne!(infos[0].file_name, infos[1].file_name);
    }

    #[test]
    fn test_delete_backup() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        service.create_backup(&[editor()], temp.path());
        let entry = service.backup_infos(temp.path()).remove(0);

        assert!(service.delete_backup(temp.path(), entry.id));
        assert!(service.backup_infos(temp.path()).is_empty());
        assert!(!temp.path().join(&entry.file_name).exists());
        assert!(!service.delete_backup(temp.path(), entry.id));
    }

    #[test]
    fn test_restore_writes_registry_values() {
        let temp = TempDir::new().unwrap();
        let (service, store) = service();
        service.create_backup(&[editor()], temp.path());

        assert!(service.restore_latest_backup(temp.path()));
        assert_eq!(store.get_value(KEY, "DisplayName").unwrap(), Some(RegValue::from("Editor")));
        assert_eq!(store.get_value(KEY, "EstimatedSize").unwrap(), Some(RegValue::DWord(4096)));
        assert_eq!(store.get_value(KEY, "NoModify").unwrap(), Some(RegValue::DWord(1)));
        assert_eq!(store.get_value(KEY, "Comments").unwrap(), None);
    }

    #[test]
    fn test_restore_sub_kilobyte_size_stays_non_zero() {
        let temp = TempDir::new().unwrap();
        let (service, store) = service();
        let small = ProgramRecord {
            estimated_size: 500,
            ..editor()
        };
        service.create_backup(&[small], temp.path());

        assert!(service.restore_latest_backup(temp.path()));
        assert_eq!(store.get_value(KEY, "EstimatedSize").unwrap(), Some(RegValue::DWord(1)));

        let reread: ProgramRecord = service.serializer.deserialize(KEY).unwrap();
        assert_eq!(reread.estimated_size, 1000);
    }

    #[test]
    fn test_failed_manifest_update_discards_data_file() {
        let temp = TempDir::new().unwrap();
        let data_path = temp.path().join("Windows-Registry_2024-01-01_00-00-00.json");
        fs::write(&data_path, "[]").unwrap();

        assert!(discard_on_error(&data_path, Ok(())).is_ok());
        assert!(data_path.exists());

        let failed = discard_on_error(&data_path, Err(ProgInfoError::Other("disk full".into())));
        assert!(failed.is_err());
        assert!(!data_path.exists());
    }

    #[test]
    fn test_restore_latest_without_backups_fails() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        assert!(!service.restore_latest_backup(temp.path()));
    }

    #[test]
    fn test_restore_missing_data_file_fails() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        service.create_backup(&[editor()], temp.path());
        let entry = service.backup_infos(temp.path()).remove(0);
        fs::remove_file(temp.path().join(&entry.file_name)).unwrap();

        assert!(!service.restore_backup(temp.path(), &entry));
    }

    #[test]
    fn test_corrupt_manifest_lists_nothing() {
        let temp = TempDir::new().unwrap();
        let (service, _) = service();
        fs::write(service.manifest_path(temp.path()), "garbage").unwrap();

        assert!(service.backup_infos(temp.path()).is_empty());
        assert!(!service.create_backup(&[editor()], temp.path()));
    }
}
