//! Name normalization shared by icon matching and backup file naming.

use regex::Regex;
use std::sync::LazyLock;

/// Characters Windows refuses in file names.
const INVALID_FILE_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Regex for any run of whitespace.
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Lowercased name with all whitespace removed.
///
/// ```
/// use proginfo_core::naming::generalize;
///
/// assert_eq!(generalize("Visual Studio Code"), "visualstudiocode");
/// ```
pub fn generalize(name: &str) -> String {
    WHITESPACE.replace_all(name, "").to_lowercase()
}

/// Whether either name contains the other once both are generalized.
///
/// Empty names never match.
pub fn contains_generalized(a: &str, b: &str) -> bool {
    let a = generalize(a);
    let b = generalize(b);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a.contains(&b) || b.contains(&a)
}

/// Strip characters that are invalid in Windows file names.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_control() && !INVALID_FILE_NAME_CHARS.contains(c))
        .collect()
}

/// Base name for backup files of a source: sanitized, spaces as hyphens.
pub fn backup_base_name(source_key: &str) -> String {
    sanitize_file_name(source_key).replace(' ', "-")
}
