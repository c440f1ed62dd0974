//! Backup methods on ProgramInfoApi.

use crate::backup::BackupManifestEntry;
use crate::programs::ProgramRecord;
use crate::ProgramInfoApi;
use std::path::Path;
use uuid::Uuid;

impl ProgramInfoApi {
    /// Snapshot `records` into `folder`.
    pub fn create_backup(&self, records: &[ProgramRecord], folder: &Path) -> bool {
        self.backup.create_backup(records, folder)
    }

    /// Backups of this source in `folder`, oldest first.
    pub fn backup_infos(&self, folder: &Path) -> Vec<BackupManifestEntry> {
        self.backup.backup_infos(folder)
    }

    pub fn delete_backup(&self, folder: &Path, id: Uuid) -> bool {
        self.backup.delete_backup(folder, id)
    }

    pub fn read_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> Option<Vec<ProgramRecord>> {
        self.backup.read_backup(folder, entry)
    }

    /// Write the records of one backup back into the store.
    pub fn restore_backup(&self, folder: &Path, entry: &BackupManifestEntry) -> bool {
        self.backup.restore_backup(folder, entry)
    }

    pub fn restore_latest_backup(&self, folder: &Path) -> bool {
        self.backup.restore_latest_backup(folder)
    }
}
