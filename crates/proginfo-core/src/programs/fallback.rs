//! Values derived from the filesystem when the registry lacks them.

use super::record::ProgramRecord;
use std::path::Path;
use tracing::debug;
use walkdir::WalkDir;

/// Fill in properties the uninstall entry did not provide.
///
/// Currently the estimated size, computed as the total size of all files
/// below the install location.
pub fn fetch_fallback_properties(record: &mut ProgramRecord) {
    if record.estimated_size != -1 {
        return;
    }
    let Some(location) = record.install_location.as_deref().filter(|s| !s.is_empty()) else {
        return;
    };
    if let Some(size) = directory_size(Path::new(location)) {
        debug!("Estimated size of {} from {}: {} bytes", record, location, size);
        record.estimated_size = size;
    }
}

/// Total size of all files below `dir`, or `None` if it is not a directory.
pub fn directory_size(dir: &Path) -> Option<i64> {
    if !dir.is_dir() {
        return None;
    }
    let total: u64 = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| entry.metadata().ok())
        .map(|metadata| metadata.len())
        .sum();
    i64::try_from(total).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_size_from_install_location() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.bin"), vec![0u8; 100]).unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("sub").join("b.bin"), vec![0u8; 50]).unwrap();

        let mut record = ProgramRecord {
            install_location: Some(temp.path().display().to_string()),
            ..ProgramRecord::default()
        };
        fetch_fallback_properties(&mut record);
        assert_eq!(record.estimated_size, 150);
    }

    #[test]
    fn test_known_size_is_kept() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.bin"), vec![0u8; 100]).unwrap();

        let mut record = ProgramRecord {
            estimated_size: 7000,
            install_location: Some(temp.path().display().to_string()),
            ..ProgramRecord::default()
        };
        fetch_fallback_properties(&mut record);
        assert_eq!(record.estimated_size, 7000);
    }

    #[test]
    fn test_missing_location_leaves_unknown() {
        let mut record = ProgramRecord {
            install_location: Some("/definitely/not/here".into()),
            ..ProgramRecord::default()
        };
        fetch_fallback_properties(&mut record);
        assert_eq!(record.estimated_size, -1);
    }
}
