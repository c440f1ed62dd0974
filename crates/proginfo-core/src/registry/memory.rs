//! In-memory key-value store.
//!
//! Keys and value names are case-insensitive, like the real registry, while
//! the original spelling is kept for enumeration. Used for tests and for
//! replaying backups without touching the live registry.

use super::path::{self, RegPath};
use super::store::KeyValueStore;
use super::value::RegValue;
use crate::error::{ProgInfoError, Result};
use std::collections::BTreeMap;
use std::sync::RwLock;

#[derive(Debug, Clone, Default)]
struct MemoryKey {
    /// Last path segment as first written.
    name: String,
    /// Lowercased value name -> (original name, value).
    values: BTreeMap<String, (String, RegValue)>,
}

/// Thread-safe in-memory registry.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Canonical (lowercased) key path -> key.
    keys: RwLock<BTreeMap<String, MemoryKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper that creates `key_path` with `values`.
    pub fn with_key<I, N>(self, key_path: &str, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = (N, RegValue)>,
        N: Into<String>,
    {
        self.create_key(key_path)?;
        for (name, value) in values {
            self.set_value(key_path, &name.into(), value)?;
        }
        Ok(self)
    }

    /// Create `key_path` and all of its ancestors.
    pub fn create_key(&self, key_path: &str) -> Result<()> {
        let parsed = RegPath::parse(key_path)?;
        let mut keys = self.write_keys()?;
        Self::ensure_key(&mut keys, &parsed);
        Ok(())
    }

    /// Remove `key_path` and everything below it.
    pub fn delete_key(&self, key_path: &str) -> Result<bool> {
        let canonical = RegPath::parse(key_path)?.canonical();
        let prefix = format!("{}\\", canonical);
        let mut keys = self.write_keys()?;
        let before = keys.len();
        keys.retain(|k, _| k != &canonical && !k.starts_with(&prefix));
        Ok(keys.len() != before)
    }

    fn ensure_key(keys: &mut BTreeMap<String, MemoryKey>, parsed: &RegPath) {
        let mut current = parsed.hive().long_name().to_string();
        keys.entry(current.to_lowercase()).or_insert_with(|| MemoryKey {
            name: parsed.hive().long_name().to_string(),
            values: BTreeMap::new(),
        });

        for segment in parsed.subkey().split('\\').filter(|s| !s.is_empty()) {
            current = path::join(&current, segment);
            keys.entry(current.to_lowercase()).or_insert_with(|| MemoryKey {
                name: segment.to_string(),
                values: BTreeMap::new(),
            });
        }
    }

    fn read_keys(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, MemoryKey>>> {
        self.keys
            .read()
            .map_err(|_| ProgInfoError::Other("Failed to acquire read lock for memory store".to_string()))
    }

    fn write_keys(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, MemoryKey>>> {
        self.keys
            .write()
            .map_err(|_| ProgInfoError::Other("Failed to acquire write lock for memory store".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_value(&self, key_path: &str, name: &str) -> Result<Option<RegValue>> {
        let canonical = RegPath::parse(key_path)?.canonical();
        let keys = self.read_keys()?;
        Ok(keys
            .get(&canonical)
            .and_then(|key| key.values.get(&name.to_lowercase()))
            .map(|(_, value)| value.clone()))
    }

    fn subkey_names(&self, key_path: &str) -> Result<Option<Vec<String>>> {
        let canonical = RegPath::parse(key_path)?.canonical();
        let keys = self.read_keys()?;
        if !keys.contains_key(&canonical) {
            return Ok(None);
        }

        let prefix = format!("{}\\", canonical);
        let names = keys
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('\\'))
            .map(|(_, key)| key.name.clone())
            .collect();
        Ok(Some(names))
    }

    fn values(&self, key_path: &str) -> Result<Option<Vec<(String, RegValue)>>> {
        let canonical = RegPath::parse(key_path)?.canonical();
        let keys = self.read_keys()?;
        Ok(keys.get(&canonical).map(|key| {
            key.values
                .values()
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect()
        }))
    }

    fn set_value(&self, key_path: &str, name: &str, value: RegValue) -> Result<()> {
        let parsed = RegPath::parse(key_path)?;
        let canonical = parsed.canonical();
        let mut keys = self.write_keys()?;
        Self::ensure_key(&mut keys, &parsed);
        if let Some(key) = keys.get_mut(&canonical) {
            // An existing value keeps the casing it was created with.
            key.values
                .entry(name.to_lowercase())
                .and_modify(|(_, stored)| *stored = value.clone())
                .or_insert_with(|| (name.to_string(), value));
        }
        Ok(())
    }
}
