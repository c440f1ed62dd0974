//! Integration tests for the ProgramInfoApi public interface.
//!
//! A whole scan, fusion, backup and restore cycle runs against in-memory
//! registries seeded like a real machine.

use chrono::NaiveDate;
use proginfo_core::config::RegistryConfig;
use proginfo_core::registry::path;
use proginfo_core::{KeyValueStore, MemoryStore, ProgramInfoApi, ProgramRecord, RegValue};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const LM64: &str = RegistryConfig::LOCAL_MACHINE_UNINSTALL_64;
const LM32: &str = RegistryConfig::LOCAL_MACHINE_UNINSTALL_32;
const CU64: &str = RegistryConfig::CURRENT_USER_UNINSTALL_64;
const VIEWER_ID: &str = "{6F1A2B3C-0000-4D5E-8F90-123456789ABC}";

/// Single 32x32 image `.ico` file.
fn ico_bytes() -> Vec<u8> {
    let mut bytes = Vec::new();
    bytes.extend_from_slice(&0u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&[32, 32, 0, 0]);
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&32u16.to_le_bytes());
    bytes.extend_from_slice(&8u32.to_le_bytes());
    bytes.extend_from_slice(&22u32.to_le_bytes());
    bytes.extend_from_slice(&[7u8; 8]);
    bytes
}

/// Install directories for both programs and a seeded registry.
fn create_test_env() -> (TempDir, Arc<MemoryStore>) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");

    let editor_dir = temp_dir.path().join("Editor");
    std::fs::create_dir_all(&editor_dir).unwrap();
    std::fs::write(editor_dir.join("editor.ico"), ico_bytes()).unwrap();

    let viewer_dir = temp_dir.path().join("Viewer");
    std::fs::create_dir_all(viewer_dir.join("bin")).unwrap();
    std::fs::write(viewer_dir.join("bin").join("Viewer.exe"), vec![0u8; 300]).unwrap();
    std::fs::write(viewer_dir.join("readme.txt"), vec![0u8; 200]).unwrap();

    let icon = format!("{},0", editor_dir.join("editor.ico").display());
    let store = MemoryStore::new()
        .with_key(
            &path::join(LM64, "Editor"),
            [
                ("DisplayName", RegValue::from("Editor")),
                ("DisplayVersion", RegValue::from("2.4.1")),
                ("Publisher", RegValue::from("ACME")),
                ("InstallDate", RegValue::from("20230115")),
                ("VersionMajor", RegValue::DWord(2)),
                ("EstimatedSize", RegValue::DWord(1024)),
                ("InstallLocation", RegValue::String(editor_dir.display().to_string())),
                ("DisplayIcon", RegValue::String(icon)),
                ("UninstallString", RegValue::from(r"C:\Editor\uninst.exe")),
            ],
        )
        .unwrap()
        .with_key(
            &path::join(LM32, "Editor"),
            [
                ("DisplayName", RegValue::from("Editor")),
                ("Publisher", RegValue::from("ACME (x86)")),
                ("HelpLink", RegValue::from("https://example.com/help")),
                ("VersionMinor", RegValue::DWord(4)),
            ],
        )
        .unwrap()
        .with_key(
            &path::join(CU64, VIEWER_ID),
            [
                ("DisplayName", RegValue::from("Viewer")),
                ("Language", RegValue::DWord(1031)),
                ("SystemComponent", RegValue::DWord(1)),
                ("InstallLocation", RegValue::String(viewer_dir.display().to_string())),
            ],
        )
        .unwrap()
        .with_key(&path::join(LM64, "KB000001"), [("ParentKeyName", RegValue::from("OS"))])
        .unwrap();

    (temp_dir, Arc::new(store))
}

fn api_for(store: Arc<MemoryStore>) -> ProgramInfoApi {
    ProgramInfoApi::builder()
        .store(store)
        .installer_roots(Vec::new())
        .load_icons(true)
        .build()
        .unwrap()
}

fn find<'a>(records: &'a [ProgramRecord], name: &str) -> &'a ProgramRecord {
    records
        .iter()
        .find(|r| r.name() == Some(name))
        .unwrap_or_else(|| panic!("{name} not listed"))
}

#[tokio::test]
async fn test_list_programs_fuses_and_enriches() {
    let (_temp_dir, store) = create_test_env();
    let api = api_for(store);

    let programs = api.list_programs().await;
    assert_eq!(programs.len(), 2);

    let editor = find(&programs, "Editor");
    assert_eq!(editor.id, "Editor");
    assert_eq!(editor.reg_key, path::join(LM64, "Editor"));
    assert_eq!(editor.publisher.as_deref(), Some("ACME"));
    assert_eq!(editor.help_link.as_deref(), Some("https://example.com/help"));
    assert_eq!(editor.version_major, 2);
    assert_eq!(editor.version_minor, 4);
    assert_eq!(editor.estimated_size, 1_024_000);
    assert_eq!(
        editor.install_date,
        NaiveDate::from_ymd_opt(2023, 1, 15).unwrap().and_hms_opt(0, 0, 0)
    );

    let icon = editor.display_icon_info.as_ref().expect("icon resolved");
    assert!(icon.path.ends_with("editor.ico"));
    assert_eq!(icon.index, 0);
    let payload = editor.display_icon_payload.bytes().expect("icon loaded");
    assert_eq!(&payload[22..], &[7u8; 8]);

    let viewer = find(&programs, "Viewer");
    assert_eq!(viewer.id, VIEWER_ID);
    assert!(viewer.system_component);
    assert_eq!(viewer.locale.as_ref().map(|l| l.name.as_str()), Some("de-DE"));
    // Size computed from the install directory.
    assert_eq!(viewer.estimated_size, 500);
    // Found by scanning the install directory for a matching executable.
    let viewer_icon = viewer.display_icon_info.as_ref().expect("exe found");
    assert!(viewer_icon.path.ends_with("Viewer.exe"));
    assert!(viewer.display_icon_payload.is_empty());
}

#[tokio::test]
async fn test_backup_restore_round_trip() {
    let (temp_dir, store) = create_test_env();
    let api = api_for(store);
    let backups = temp_dir.path().join("backups");

    let programs = api.list_programs().await;
    assert!(api.create_backup(&programs, &backups));
    let infos = api.backup_infos(&backups);
    assert_eq!(infos.len(), 1);
    assert_eq!(infos[0].program_amount, 2);
    let stored = api.read_backup(&backups, &infos[0]).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].reg_key, programs[0].reg_key);

    // Replay into an empty registry.
    let fresh_store = Arc::new(MemoryStore::new());
    let restored_api = api_for(fresh_store.clone());
    assert!(restored_api.restore_latest_backup(&backups));

    let editor_key = path::join(LM64, "Editor");
    assert_eq!(
        fresh_store.get_value(&editor_key, "HelpLink").unwrap(),
        Some(RegValue::from("https://example.com/help"))
    );
    assert_eq!(
        fresh_store.get_value(&editor_key, "EstimatedSize").unwrap(),
        Some(RegValue::DWord(1024))
    );

    let restored = restored_api.list_programs().await;
    assert_eq!(restored.len(), 2);
    let original = find(&programs, "Editor");
    let editor = find(&restored, "Editor");
    assert_eq!(editor.publisher, original.publisher);
    assert_eq!(editor.display_version, original.display_version);
    assert_eq!(editor.install_date, original.install_date);
    assert_eq!(editor.estimated_size, original.estimated_size);
    assert_eq!(editor.version_minor, 4);
    assert!(find(&restored, "Viewer").system_component);

    assert!(api.delete_backup(&backups, infos[0].id));
    assert!(api.backup_infos(&backups).is_empty());
    assert!(!api.restore_latest_backup(&backups));
}

#[tokio::test]
async fn test_refresh_program_picks_up_changes() {
    let (_temp_dir, store) = create_test_env();
    let api = api_for(store.clone());

    let programs = api.list_programs().await;
    let mut editor = find(&programs, "Editor").clone();

    store
        .set_value(&editor.reg_key, "DisplayVersion", RegValue::from("3.0"))
        .unwrap();
    assert!(api.refresh_program(&mut editor));
    assert_eq!(editor.display_version.as_deref(), Some("3.0"));
    assert_eq!(editor.id, "Editor");

    store.delete_key(&editor.reg_key).unwrap();
    assert!(!api.refresh_program(&mut editor));
}

#[tokio::test]
async fn test_actions_refuse_foreign_records() {
    let (_temp_dir, store) = create_test_env();
    let api = api_for(store);

    let foreign = ProgramRecord {
        source_key: "Other Source".into(),
        uninstall_string: Some("uninstall.exe".into()),
        ..ProgramRecord::default()
    };
    assert!(!api.is_responsible(&foreign));
    assert!(!api.uninstall(&foreign, false).await);
}

#[test]
fn test_backup_folder_without_manifest_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let api = api_for(Arc::new(MemoryStore::new()));
    assert!(api.backup_infos(temp_dir.path()).is_empty());
    assert!(!api.restore_latest_backup(Path::new("/nonexistent/backups")));
}
