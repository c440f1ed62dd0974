//! Best-effort icon location for a program record.
//!
//! Sources are tried in order: the record's `DisplayIcon`, the Windows
//! Installer icon caches for MSI product codes, then executables below the
//! install location.

use super::reference::{split_icon_index, IconReference};
use crate::config::IconConfig;
use crate::naming::contains_generalized;
use crate::programs::ProgramRecord;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Resolves [`IconReference`]s for records.
#[derive(Debug, Clone)]
pub struct IconFinder {
    /// Directories holding one subdirectory per MSI product code.
    installer_roots: Vec<PathBuf>,
}

impl Default for IconFinder {
    fn default() -> Self {
        Self::new(Self::default_installer_roots())
    }
}

impl IconFinder {
    pub fn new(installer_roots: Vec<PathBuf>) -> Self {
        Self { installer_roots }
    }

    /// `%SystemRoot%\Installer` and `%APPDATA%\Microsoft\Installer`.
    pub fn default_installer_roots() -> Vec<PathBuf> {
        let mut roots = Vec::new();
        if let Some(system_root) = std::env::var_os("SystemRoot").or_else(|| std::env::var_os("WINDIR")) {
            roots.push(PathBuf::from(system_root).join(IconConfig::INSTALLER_DIR_NAME));
        }
        if let Some(app_data) = dirs::config_dir() {
            roots.push(app_data.join("Microsoft").join(IconConfig::INSTALLER_DIR_NAME));
        }
        roots
    }

    pub fn installer_roots(&self) -> &[PathBuf] {
        &self.installer_roots
    }

    /// Find the icon for `record`, or `None` if no source yields an existing
    /// file.
    pub fn resolve_icon(&self, record: &ProgramRecord) -> Option<IconReference> {
        let mut index = -1;
        let mut group_name = None;
        let mut path = None;

        if let Some(display_icon) = record.display_icon.as_deref().filter(|s| !s.is_empty()) {
            if is_container(display_icon) {
                let spec = split_icon_index(display_icon);
                index = spec.index;
                group_name = spec.group_name;
            }
            path = path_from_display_icon(display_icon);
        }

        if path.is_none() {
            if let Some(name) = record.name() {
                if record.id.starts_with('{') && record.id.ends_with('}') {
                    path = self.path_from_installer_cache(&record.id, name);
                }
                if path.is_none() {
                    if let Some(location) = record.install_location.as_deref().filter(|s| !s.is_empty()) {
                        path = path_from_app_directory(Path::new(location), name);
                    }
                }
            }
        }

        let path = path?;
        debug!("Resolved icon for {}: {}", record, path.display());
        Some(IconReference {
            path,
            index,
            group_name,
        })
    }

    fn path_from_installer_cache(&self, product_code: &str, display_name: &str) -> Option<PathBuf> {
        self.installer_roots
            .iter()
            .map(|root| root.join(product_code))
            .filter(|dir| dir.is_dir())
            .find_map(|dir| {
                let files = list_files_by_size(&dir);
                pick_file(&with_extension(&files, Some("ico")), display_name)
                    .or_else(|| pick_file(&with_extension(&files, Some("exe")), display_name))
                    .or_else(|| pick_file(&with_extension(&files, None), display_name))
            })
    }
}

/// Extension of the last segment of a Windows or POSIX path, lowercased,
/// without the dot; empty when there is none.
fn extension_of(path: &str) -> String {
    let file_name = path.rsplit(['\\', '/']).next().unwrap_or(path);
    match file_name.rfind('.') {
        Some(pos) if pos > 0 => file_name[pos + 1..].to_lowercase(),
        _ => String::new(),
    }
}

fn is_container(display_icon: &str) -> bool {
    let extension = extension_of(display_icon);
    extension.is_empty()
        || IconConfig::CONTAINER_EXTENSIONS
            .iter()
            .any(|ext| extension.contains(ext))
}

fn is_image(display_icon: &str) -> bool {
    let extension = extension_of(display_icon);
    IconConfig::IMAGE_EXTENSIONS
        .iter()
        .any(|ext| extension.contains(ext))
}

fn path_from_display_icon(display_icon: &str) -> Option<PathBuf> {
    let candidate = if is_container(display_icon) {
        PathBuf::from(split_icon_index(display_icon).path.trim().trim_matches('"'))
    } else if is_image(display_icon) {
        PathBuf::from(display_icon.trim().trim_matches('"'))
    } else {
        return None;
    };
    candidate.is_file().then_some(candidate)
}

fn list_files_by_size(dir: &Path) -> Vec<(PathBuf, u64)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot read {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut files: Vec<(PathBuf, u64)> = entries
        .flatten()
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            metadata.is_file().then(|| (entry.path(), metadata.len()))
        })
        .collect();
    files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    files
}

/// Files with the given extension (`None`: no extension), size order kept.
fn with_extension(files: &[(PathBuf, u64)], extension: Option<&str>) -> Vec<PathBuf> {
    files
        .iter()
        .filter(|(path, _)| {
            let actual = path.extension().and_then(|e| e.to_str());
            match (extension, actual) {
                (Some(wanted), Some(actual)) => actual.eq_ignore_ascii_case(wanted),
                (None, None) => true,
                _ => false,
            }
        })
        .map(|(path, _)| path.clone())
        .collect()
}

fn file_stem(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or_default()
}

/// Prefer a file named like the program, then the smallest one hinting at
/// an icon, then simply the first (largest) file.
fn pick_file(files: &[PathBuf], display_name: &str) -> Option<PathBuf> {
    files
        .iter()
        .find(|path| contains_generalized(file_stem(path), display_name))
        .or_else(|| {
            files.iter().rev().find(|path| {
                IconConfig::FILE_HINT_TOKENS
                    .iter()
                    .any(|token| contains_generalized(file_stem(path), token))
            })
        })
        .or_else(|| files.first())
        .cloned()
}

fn path_from_app_directory(location: &Path, display_name: &str) -> Option<PathBuf> {
    if !location.is_dir() {
        return None;
    }
    WalkDir::new(location)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .find(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("exe"))
                && contains_generalized(file_stem(path), display_name)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, len: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; len]).unwrap();
    }

    fn record(name: &str) -> ProgramRecord {
        ProgramRecord {
            display_name: Some(name.to_string()),
            ..ProgramRecord::default()
        }
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of(r"C:\a\b.EXE,0"), "exe,0");
        assert_eq!(extension_of(r"C:\a.b\tool"), "");
        assert_eq!(extension_of("/tmp/logo.png"), "png");
    }

    #[test]
    fn test_display_icon_with_index() {
        let temp = TempDir::new().unwrap();
        let exe = temp.path().join("app.exe");
        write(&exe, 10);

        let mut program = record("App");
        program.display_icon = Some(format!("\"{}\",-2", exe.display()));

        let reference = IconFinder::new(vec![]).resolve_icon(&program).unwrap();
        assert_eq!(reference.path, exe);
        assert_eq!(reference.index, -2);
        assert_eq!(reference.group_name.as_deref(), Some("2"));
    }

    #[test]
    fn test_display_icon_image_file() {
        let temp = TempDir::new().unwrap();
        let png = temp.path().join("logo.png");
        write(&png, 10);

        let mut program = record("App");
        program.display_icon = Some(png.display().to_string());

        let reference = IconFinder::new(vec![]).resolve_icon(&program).unwrap();
        assert_eq!(reference.path, png);
        assert_eq!(reference.index, -1);
    }

    #[test]
    fn test_installer_cache_prefers_ico_named_like_program() {
        let temp = TempDir::new().unwrap();
        let guid = "{11111111-2222-3333-4444-555555555555}";
        let cache = temp.path().join(guid);
        write(&cache.join("big.exe"), 500);
        write(&cache.join("generic.ico"), 300);
        write(&cache.join("My App.ico"), 100);

        let mut program = record("MyApp");
        program.id = guid.to_string();

        let reference = IconFinder::new(vec![temp.path().to_path_buf()])
            .resolve_icon(&program)
            .unwrap();
        assert_eq!(reference.path, cache.join("My App.ico"));
    }

    #[test]
    fn test_installer_cache_falls_back_to_largest() {
        let temp = TempDir::new().unwrap();
        let guid = "{ABC}";
        let cache = temp.path().join(guid);
        write(&cache.join("small.ico"), 10);
        write(&cache.join("large.ico"), 90);
        write(&cache.join("appicon.exe"), 900);

        let mut program = record("Unrelated");
        program.id = guid.to_string();

        let reference = IconFinder::new(vec![temp.path().to_path_buf()])
            .resolve_icon(&program)
            .unwrap();
        assert_eq!(reference.path, cache.join("large.ico"));
    }

    #[test]
    fn test_installer_cache_icon_hint() {
        let temp = TempDir::new().unwrap();
        let guid = "{DEF}";
        let cache = temp.path().join(guid);
        write(&cache.join("zzz.ico"), 90);
        write(&cache.join("ProductIcon.ico"), 10);

        let mut program = record("Unrelated");
        program.id = guid.to_string();

        let reference = IconFinder::new(vec![temp.path().to_path_buf()])
            .resolve_icon(&program)
            .unwrap();
        assert_eq!(reference.path, cache.join("ProductIcon.ico"));
    }

    #[test]
    fn test_installer_cache_icon_hint_takes_last_in_size_order() {
        let temp = TempDir::new().unwrap();
        let guid = "{DEF}";
        let cache = temp.path().join(guid);
        write(&cache.join("AppIcon.ico"), 80);
        write(&cache.join("zzz.ico"), 60);
        write(&cache.join("Logo.ico"), 20);
        write(&cache.join("aaa.ico"), 5);

        let mut program = record("Unrelated");
        program.id = guid.to_string();

        let reference = IconFinder::new(vec![temp.path().to_path_buf()])
            .resolve_icon(&program)
            .unwrap();
        assert_eq!(reference.path, cache.join("Logo.ico"));
    }

    #[test]
    fn test_install_location_scan() {
        let temp = TempDir::new().unwrap();
        write(&temp.path().join("bin").join("helper.exe"), 10);
        write(&temp.path().join("bin").join("Cool Tool.exe"), 10);

        let mut program = record("CoolTool");
        program.install_location = Some(temp.path().display().to_string());
        // A missing DisplayIcon file falls through to the directory scan.
        program.display_icon = Some(r"C:\missing\tool.exe,1".to_string());

        let reference = IconFinder::new(vec![]).resolve_icon(&program).unwrap();
        assert_eq!(reference.path, temp.path().join("bin").join("Cool Tool.exe"));
        assert_eq!(reference.index, 1);
    }

    #[test]
    fn test_nothing_found() {
        let program = record("Ghost");
        assert!(IconFinder::new(vec![]).resolve_icon(&program).is_none());
    }
}
