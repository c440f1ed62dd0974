//! Live Windows registry backend.

use super::path::{Hive, RegPath};
use super::store::KeyValueStore;
use super::value::RegValue;
use crate::error::{ProgInfoError, Result};
use std::io;
use tracing::debug;
use winreg::enums::*;
use winreg::types::{FromRegValue, ToRegValue};
use winreg::RegKey;

/// [`KeyValueStore`] over the local machine's registry.
///
/// Opens keys read-only for queries and with `KEY_WRITE` only when setting
/// values. Keys that do not exist, or that the process may not open, read
/// as absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsRegistryStore;

impl WindowsRegistryStore {
    pub fn new() -> Self {
        Self
    }

    fn root(hive: Hive) -> RegKey {
        let predef = match hive {
            Hive::LocalMachine => HKEY_LOCAL_MACHINE,
            Hive::CurrentUser => HKEY_CURRENT_USER,
            Hive::Users => HKEY_USERS,
            Hive::CurrentConfig => HKEY_CURRENT_CONFIG,
            Hive::ClassesRoot => HKEY_CLASSES_ROOT,
            Hive::PerformanceData => HKEY_PERFORMANCE_DATA,
        };
        RegKey::predef(predef)
    }

    fn open(key_path: &str) -> Result<Option<RegKey>> {
        let parsed = RegPath::parse(key_path)?;
        match Self::root(parsed.hive()).open_subkey(parsed.subkey()) {
            Ok(key) => Ok(Some(key)),
            Err(e) if is_absent(&e) => {
                debug!("Registry key not available: {} ({})", key_path, e);
                Ok(None)
            }
            Err(e) => Err(ProgInfoError::registry(key_path, e.to_string())),
        }
    }
}

fn is_absent(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
    )
}

fn decode(key_path: &str, raw: &winreg::RegValue) -> Result<RegValue> {
    let convert = |e: io::Error| ProgInfoError::registry(key_path, e.to_string());
    let value = match raw.vtype {
        REG_SZ => RegValue::String(String::from_reg_value(raw).map_err(convert)?),
        REG_EXPAND_SZ => RegValue::ExpandString(String::from_reg_value(raw).map_err(convert)?),
        REG_MULTI_SZ => RegValue::MultiString(Vec::<String>::from_reg_value(raw).map_err(convert)?),
        REG_DWORD => RegValue::DWord(u32::from_reg_value(raw).map_err(convert)?),
        REG_QWORD => RegValue::QWord(u64::from_reg_value(raw).map_err(convert)?),
        _ => RegValue::Binary(raw.bytes.clone()),
    };
    Ok(value)
}

fn encode(value: &RegValue) -> winreg::RegValue {
    match value {
        RegValue::String(s) => s.to_reg_value(),
        RegValue::ExpandString(s) => {
            let mut raw = s.to_reg_value();
            raw.vtype = REG_EXPAND_SZ;
            raw
        }
        RegValue::MultiString(items) => items.to_reg_value(),
        RegValue::DWord(v) => v.to_reg_value(),
        RegValue::QWord(v) => v.to_reg_value(),
        RegValue::Binary(bytes) => winreg::RegValue {
            bytes: bytes.clone(),
            vtype: REG_BINARY,
        },
    }
}

impl KeyValueStore for WindowsRegistryStore {
    fn get_value(&self, key_path: &str, name: &str) -> Result<Option<RegValue>> {
        let Some(key) = Self::open(key_path)? else {
            return Ok(None);
        };
        match key.get_raw_value(name) {
            Ok(raw) => decode(key_path, &raw).map(Some),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProgInfoError::registry(key_path, e.to_string())),
        }
    }

    fn subkey_names(&self, key_path: &str) -> Result<Option<Vec<String>>> {
        let Some(key) = Self::open(key_path)? else {
            return Ok(None);
        };
        let mut names = Vec::new();
        for name in key.enum_keys() {
            match name {
                Ok(name) => names.push(name),
                Err(e) => debug!("Skipping unreadable subkey of {}: {}", key_path, e),
            }
        }
        Ok(Some(names))
    }

    fn values(&self, key_path: &str) -> Result<Option<Vec<(String, RegValue)>>> {
        let Some(key) = Self::open(key_path)? else {
            return Ok(None);
        };
        let mut values = Vec::new();
        for entry in key.enum_values() {
            match entry {
                Ok((name, raw)) => values.push((name, decode(key_path, &raw)?)),
                Err(e) => debug!("Skipping unreadable value of {}: {}", key_path, e),
            }
        }
        Ok(Some(values))
    }

    fn set_value(&self, key_path: &str, name: &str, value: RegValue) -> Result<()> {
        let parsed = RegPath::parse(key_path)?;
        let (key, _) = Self::root(parsed.hive())
            .create_subkey_with_flags(parsed.subkey(), KEY_WRITE)
            .map_err(|e| ProgInfoError::registry(key_path, e.to_string()))?;
        key.set_raw_value(name, &encode(&value))
            .map_err(|e| ProgInfoError::registry(key_path, e.to_string()))
    }
}
