//! Hierarchical registry paths.
//!
//! Paths look like `HKEY_LOCAL_MACHINE\SOFTWARE\Vendor\Value`. The leading
//! token selects the hive and accepts both the long and the short alias
//! (`HKLM`), case-insensitively. A `Computer\` prefix, as copied out of
//! regedit's address bar, is ignored.

use crate::config::RegistryConfig;
use crate::error::{ProgInfoError, Result};
use std::fmt;
use std::str::FromStr;

const SEP: char = RegistryConfig::SEPARATOR;

/// Root namespace of a registry path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hive {
    LocalMachine,
    CurrentUser,
    Users,
    CurrentConfig,
    ClassesRoot,
    PerformanceData,
}

impl Hive {
    pub fn long_name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKEY_LOCAL_MACHINE",
            Hive::CurrentUser => "HKEY_CURRENT_USER",
            Hive::Users => "HKEY_USERS",
            Hive::CurrentConfig => "HKEY_CURRENT_CONFIG",
            Hive::ClassesRoot => "HKEY_CLASSES_ROOT",
            Hive::PerformanceData => "HKEY_PERFORMANCE_DATA",
        }
    }

    pub fn short_name(&self) -> &'static str {
        match self {
            Hive::LocalMachine => "HKLM",
            Hive::CurrentUser => "HKCU",
            Hive::Users => "HKU",
            Hive::CurrentConfig => "HKCC",
            Hive::ClassesRoot => "HKCR",
            Hive::PerformanceData => "HKPD",
        }
    }

    /// Look up a hive by either alias.
    pub fn from_token(token: &str) -> Option<Self> {
        const ALL: [Hive; 6] = [
            Hive::LocalMachine,
            Hive::CurrentUser,
            Hive::Users,
            Hive::CurrentConfig,
            Hive::ClassesRoot,
            Hive::PerformanceData,
        ];
        ALL.into_iter().find(|hive| {
            token.eq_ignore_ascii_case(hive.long_name())
                || token.eq_ignore_ascii_case(hive.short_name())
        })
    }
}

impl fmt::Display for Hive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.long_name())
    }
}

impl FromStr for Hive {
    type Err = ProgInfoError;

    fn from_str(s: &str) -> Result<Self> {
        Hive::from_token(s).ok_or_else(|| ProgInfoError::InvalidPath(s.to_string()))
    }
}

/// A parsed key path: hive plus the subkey below it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegPath {
    hive: Hive,
    subkey: String,
}

impl RegPath {
    /// Parse a key path.
    ///
    /// Redundant separators are collapsed; an unknown hive token is an error.
    pub fn parse(path: &str) -> Result<Self> {
        let trimmed = path.trim().trim_matches(SEP);
        let trimmed = strip_computer_prefix(trimmed);

        let (token, rest) = match trimmed.split_once(SEP) {
            Some((token, rest)) => (token, rest),
            None => (trimmed, ""),
        };

        let hive = Hive::from_token(token)
            .ok_or_else(|| ProgInfoError::InvalidPath(path.to_string()))?;

        let subkey = rest
            .split(SEP)
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(&SEP.to_string());

        Ok(Self { hive, subkey })
    }

    pub fn hive(&self) -> Hive {
        self.hive
    }

    /// Subkey below the hive, without leading or trailing separators.
    pub fn subkey(&self) -> &str {
        &self.subkey
    }

    /// Lowercased long-form path, suitable as a case-insensitive map key.
    pub fn canonical(&self) -> String {
        self.to_string().to_lowercase()
    }
}

impl fmt::Display for RegPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.subkey.is_empty() {
            f.write_str(self.hive.long_name())
        } else {
            write!(f, "{}{}{}", self.hive.long_name(), SEP, self.subkey)
        }
    }
}

fn strip_computer_prefix(path: &str) -> &str {
    let prefix_len = RegistryConfig::COMPUTER_PREFIX.len();
    match (path.get(..prefix_len), path.get(prefix_len..)) {
        (Some(head), Some(rest))
            if head.eq_ignore_ascii_case(RegistryConfig::COMPUTER_PREFIX)
                && rest.starts_with(SEP) =>
        {
            &rest[1..]
        }
        _ => path,
    }
}

/// Join a key path and a child name with exactly one separator.
pub fn join(base: &str, name: &str) -> String {
    let base = base.trim_end_matches(SEP);
    let name = name.trim_start_matches(SEP);
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}{}{}", base, SEP, name)
    }
}

/// Split `path` into its parent key and last segment.
pub fn split_last(path: &str) -> Option<(&str, &str)> {
    let path = path.trim_end_matches(SEP);
    path.rfind(SEP).map(|pos| (&path[..pos], &path[pos + 1..]))
}

/// Parent key of `path`, if any.
pub fn parent(path: &str) -> Option<&str> {
    split_last(path).map(|(parent, _)| parent)
}

/// Last segment of `path`.
pub fn file_name(path: &str) -> &str {
    match split_last(path) {
        Some((_, name)) => name,
        None => path.trim_end_matches(SEP),
    }
}
