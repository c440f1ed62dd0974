//! Process-lifetime cache of field tables, keyed by record type.

use super::mapping::{PropertyMapping, RegistryRecord};
use crate::error::{ProgInfoError, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type CachedTable = Arc<dyn Any + Send + Sync>;

/// Insert-once map from record type to its (non-ignored) field table.
///
/// Concurrent first uses may both build the table; only the first insert is
/// kept and both callers see it.
#[derive(Default)]
pub struct PropertyCache {
    tables: RwLock<HashMap<TypeId, CachedTable>>,
}

impl std::fmt::Debug for PropertyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyCache")
            .field("types", &self.len())
            .finish()
    }
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Field table for `T`, building it on first use.
    pub fn mappings<T: RegistryRecord>(&self) -> Result<Arc<Vec<PropertyMapping<T>>>> {
        let type_id = TypeId::of::<T>();

        let cached = {
            let tables = self.tables.read().map_err(|_| {
                ProgInfoError::Other("Failed to acquire read lock for property cache".to_string())
            })?;
            tables.get(&type_id).cloned()
        };
        if let Some(table) = cached {
            return downcast::<T>(table);
        }

        let built: Vec<PropertyMapping<T>> = T::mappings()
            .into_iter()
            .filter(|mapping| !mapping.is_ignored())
            .collect();
        debug!(
            "Built field table for {} ({} mapped fields)",
            std::any::type_name::<T>(),
            built.len()
        );

        let table = {
            let mut tables = self.tables.write().map_err(|_| {
                ProgInfoError::Other("Failed to acquire write lock for property cache".to_string())
            })?;
            tables
                .entry(type_id)
                .or_insert_with(|| Arc::new(built) as CachedTable)
                .clone()
        };
        downcast::<T>(table)
    }

    /// Number of record types cached so far.
    pub fn len(&self) -> usize {
        self.tables.read().map(|tables| tables.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn downcast<T: RegistryRecord>(table: CachedTable) -> Result<Arc<Vec<PropertyMapping<T>>>> {
    table.downcast::<Vec<PropertyMapping<T>>>().map_err(|_| {
        ProgInfoError::Other(format!(
            "Property cache holds a foreign table for {}",
            std::any::type_name::<T>()
        ))
    })
}
