//! Centralized configuration for ProgInfo.
//!
//! This module provides configuration constants for registry enumeration,
//! icon resolution, backups and process actions.

use std::time::Duration;

/// Application-level configuration.
pub struct AppConfig;

impl AppConfig {
    pub const APP_NAME: &'static str = "ProgInfo";
}

/// Registry enumeration configuration.
pub struct RegistryConfig;

impl RegistryConfig {
    /// Path separator used by registry key paths.
    pub const SEPARATOR: char = '\\';

    /// Prefix regedit prepends to copied key paths.
    pub const COMPUTER_PREFIX: &'static str = "Computer";

    pub const LOCAL_MACHINE_UNINSTALL_64: &'static str =
        r"HKEY_LOCAL_MACHINE\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    pub const LOCAL_MACHINE_UNINSTALL_32: &'static str =
        r"HKEY_LOCAL_MACHINE\SOFTWARE\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall";
    pub const CURRENT_USER_UNINSTALL_64: &'static str =
        r"HKEY_CURRENT_USER\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall";
    pub const CURRENT_USER_UNINSTALL_32: &'static str =
        r"HKEY_CURRENT_USER\SOFTWARE\Wow6432Node\Microsoft\Windows\CurrentVersion\Uninstall";
}

/// Backup file configuration.
pub struct BackupConfig;

impl BackupConfig {
    /// Tag identifying records produced by the registry source.
    pub const SOURCE_KEY_NAME: &'static str = "Windows Registry";
    /// Timestamp suffix of data files (`yyyy-MM-dd_HH-mm-ss`).
    pub const TIMESTAMP_FORMAT: &'static str = "%Y-%m-%d_%H-%M-%S";
    pub const FILE_EXTENSION: &'static str = "json";
}

/// Icon resolution configuration.
pub struct IconConfig;

impl IconConfig {
    /// Extensions of binary icon containers (an empty extension also qualifies).
    pub const CONTAINER_EXTENSIONS: &'static [&'static str] = &["ico", "exe"];
    /// Extensions of images returned as-is.
    pub const IMAGE_EXTENSIONS: &'static [&'static str] = &["jpg", "jpeg", "png"];
    /// File name tokens that hint at an icon inside an installer cache.
    pub const FILE_HINT_TOKENS: &'static [&'static str] = &["icon", "logo"];
    /// Group name tokens that hint at the application's main icon group.
    pub const GROUP_HINT_TOKENS: &'static [&'static str] = &["main", "logo"];
    pub const INSTALLER_DIR_NAME: &'static str = "Installer";
}

/// Process action configuration.
pub struct ActionConfig;

impl ActionConfig {
    pub const SHELL: &'static str = "cmd.exe";
    pub const EXPLORER: &'static str = "explorer.exe";
    pub const REGEDIT: &'static str = "regedit.exe";
    /// Value regedit reads to restore its last selected key.
    pub const REGEDIT_LAST_KEY: &'static str =
        r"HKEY_CURRENT_USER\Software\Microsoft\Windows\CurrentVersion\Applets\Regedit\LastKey";
    /// Upper bound on waiting for an uninstaller or modifier to exit.
    pub const ACTION_TIMEOUT: Duration = Duration::from_secs(30 * 60);
    /// Upper bound on waiting for a file browser to start.
    pub const OPEN_TIMEOUT: Duration = Duration::from_secs(5);
}
