//! Key-value store trait.

use super::path;
use super::value::RegValue;
use crate::error::Result;

/// Hierarchical key-value store with registry semantics.
///
/// Absent keys and values are `Ok(None)`, never errors. Errors are reserved
/// for paths that cannot be parsed and for backend failures.
pub trait KeyValueStore: Send + Sync {
    /// Read the value `name` of the key at `key_path`.
    fn get_value(&self, key_path: &str, name: &str) -> Result<Option<RegValue>>;

    /// Read a value addressed by a single path whose last segment is the
    /// value name.
    fn get(&self, path: &str) -> Result<Option<RegValue>> {
        match path::split_last(path) {
            Some((key_path, name)) => self.get_value(key_path, name),
            None => Ok(None),
        }
    }

    /// Names of the direct children of `key_path`, or `None` if the key does
    /// not exist.
    fn subkey_names(&self, key_path: &str) -> Result<Option<Vec<String>>>;

    /// Every value stored directly on `key_path`.
    fn values(&self, key_path: &str) -> Result<Option<Vec<(String, RegValue)>>>;

    /// Write `value` as `name` on the key at `key_path`, creating the key.
    fn set_value(&self, key_path: &str, name: &str, value: RegValue) -> Result<()>;

    /// Write a value addressed by a single path.
    fn set(&self, path: &str, value: RegValue) -> Result<()> {
        match path::split_last(path) {
            Some((key_path, name)) => self.set_value(key_path, name, value),
            None => Err(crate::error::ProgInfoError::InvalidPath(path.to_string())),
        }
    }
}
