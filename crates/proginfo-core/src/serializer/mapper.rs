//! Registry-to-record mapper.

use super::cache::PropertyCache;
use super::mapping::{PropertyMapping, RegistryRecord};
use super::options::SerializerOptions;
use crate::error::Result;
use crate::registry::{path, KeyValueStore};
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds records from registry keys and writes them back.
///
/// Cheap to clone; clones share the store, the options and the field table
/// cache.
#[derive(Clone)]
pub struct RegistrySerializer {
    store: Arc<dyn KeyValueStore>,
    options: SerializerOptions,
    cache: Arc<PropertyCache>,
}

impl std::fmt::Debug for RegistrySerializer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrySerializer")
            .field("options", &self.options)
            .field("cache", &self.cache)
            .finish()
    }
}

impl RegistrySerializer {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_options(store, SerializerOptions::default())
    }

    pub fn with_options(store: Arc<dyn KeyValueStore>, options: SerializerOptions) -> Self {
        Self {
            store,
            options,
            cache: Arc::new(PropertyCache::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    pub fn cache(&self) -> &PropertyCache {
        &self.cache
    }

    /// Map the key at `key_path` onto a new `T`.
    ///
    /// Returns `None` when not a single field could be populated. Errors
    /// are logged, never returned.
    pub fn deserialize<T: RegistryRecord>(&self, key_path: &str) -> Option<T> {
        match self.map_record(key_path, self.options.ignore_thrown_exceptions) {
            Ok(record) => record,
            Err(e) => {
                warn!("Failed to map {}: {}", key_path, e);
                None
            }
        }
    }

    /// Like [`deserialize`](Self::deserialize) but surfaces the first field
    /// error instead of skipping the field.
    pub fn try_deserialize<T: RegistryRecord>(&self, key_path: &str) -> Result<Option<T>> {
        self.map_record(key_path, false)
    }

    /// Map every direct subkey of `root`, in subkey order.
    ///
    /// `None` when `root` is missing or has no subkeys.
    pub fn deserialize_directory<T: RegistryRecord>(&self, root: &str) -> Option<Vec<T>> {
        let names = self.child_names(root)?;
        Some(
            names
                .iter()
                .filter_map(|name| self.deserialize::<T>(&path::join(root, name)))
                .collect(),
        )
    }

    /// Concurrent variant of [`deserialize_directory`](Self::deserialize_directory).
    ///
    /// Each subkey is mapped on the blocking pool; results keep subkey order.
    pub async fn deserialize_directory_async<T: RegistryRecord>(&self, root: &str) -> Option<Vec<T>> {
        let names = self.child_names(root)?;

        let tasks = names.into_iter().map(|name| {
            let serializer = self.clone();
            let key_path = path::join(root, &name);
            tokio::task::spawn_blocking(move || serializer.deserialize::<T>(&key_path))
        });

        let mut records = Vec::new();
        for joined in futures::future::join_all(tasks).await {
            match joined {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => warn!("Mapping task under {} failed: {}", root, e),
            }
        }
        Some(records)
    }

    /// Write every known field of `record` below `key_path`, under each
    /// field's first candidate name.
    pub fn serialize<T: RegistryRecord>(&self, record: &T, key_path: &str) -> Result<usize> {
        let mappings = self.cache.mappings::<T>()?;
        let mut written = 0;
        for mapping in mappings.iter() {
            let Some(value) = mapping.read(record) else {
                continue;
            };
            let Some(name) = mapping.candidate_names().first() else {
                continue;
            };
            let raw = match mapping.post_processor() {
                Some(post) => post.revert(&value)?,
                None => value.to_raw(),
            };
            self.store.set_value(key_path, name, raw)?;
            written += 1;
        }
        debug!("Wrote {} values to {}", written, key_path);
        Ok(written)
    }

    fn child_names(&self, root: &str) -> Option<Vec<String>> {
        match self.store.subkey_names(root) {
            Ok(Some(names)) if !names.is_empty() => Some(names),
            Ok(_) => None,
            Err(e) => {
                warn!("Failed to list subkeys of {}: {}", root, e);
                None
            }
        }
    }

    fn map_record<T: RegistryRecord>(&self, key_path: &str, swallow: bool) -> Result<Option<T>> {
        let mappings = self.cache.mappings::<T>()?;
        let mut record = T::default();
        let mut populated = 0usize;

        for mapping in mappings.iter() {
            if self.read_field(&mut record, mapping, key_path, swallow)? {
                populated += 1;
            }
        }

        if populated == 0 {
            debug!("No mapped values under {}", key_path);
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Try each candidate name until one yields a value; `true` if the field
    /// was assigned.
    fn read_field<T: RegistryRecord>(
        &self,
        record: &mut T,
        mapping: &PropertyMapping<T>,
        key_path: &str,
        swallow: bool,
    ) -> Result<bool> {
        for name in mapping.candidate_names() {
            match self.read_candidate(record, mapping, key_path, name) {
                Ok(true) => return Ok(true),
                Ok(false) => {}
                Err(e) if swallow => {
                    debug!("Skipping {}\\{} for {}: {}", key_path, name, mapping.field(), e)
                }
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }

    fn read_candidate<T: RegistryRecord>(
        &self,
        record: &mut T,
        mapping: &PropertyMapping<T>,
        key_path: &str,
        name: &str,
    ) -> Result<bool> {
        let Some(raw) = self.store.get_value(key_path, name)? else {
            return Ok(false);
        };

        let converter = match mapping.converter_override() {
            Some(converter) => converter.clone(),
            None => self.options.converter_for(mapping.kind()),
        };
        let Some(value) = converter.try_read(&raw, mapping.kind())? else {
            return Ok(false);
        };

        let value = match mapping.post_processor() {
            Some(post) => post.apply(value)?,
            None => value,
        };
        mapping.assign(record, value)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{MemoryStore, RegValue};
    use crate::serializer::converter::RegistryConverter;
    use crate::serializer::mapping::EstimatedSizePostProcess;
    use crate::serializer::value::{FieldKind, FieldValue};

    const ROOT: &str = r"HKLM\Software\Test";

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Entry {
        name: Option<String>,
        size: Option<i64>,
        flag: bool,
        major: Option<i32>,
    }

    impl RegistryRecord for Entry {
        fn mappings() -> Vec<PropertyMapping<Self>> {
            vec![
                PropertyMapping::<Self>::string("Name", |r, v| r.name = Some(v), |r| r.name.as_deref()),
                PropertyMapping::<Self>::long("EstimatedSize", |r, v| r.size = Some(v), |r| r.size)
                    .names(&["EstimatedSize", "Size"])
                    .post_process(Arc::new(EstimatedSizePostProcess)),
                PropertyMapping::<Self>::bool("Flag", |r, v| r.flag = v, |r| r.flag),
                PropertyMapping::<Self>::int("Major", |r, v| r.major = Some(v), |r| r.major),
                PropertyMapping::<Self>::ignored("Payload"),
            ]
        }
    }

    fn serializer(store: MemoryStore) -> RegistrySerializer {
        RegistrySerializer::new(Arc::new(store))
    }

    #[test]
    fn test_single_value_is_enough() {
        let store = MemoryStore::new()
            .with_key(&format!(r"{}\A", ROOT), [("Name", RegValue::from("Foo"))])
            .unwrap();
        let entry: Entry = serializer(store).deserialize(&format!(r"{}\A", ROOT)).unwrap();
        assert_eq!(
            entry,
            Entry {
                name: Some("Foo".into()),
                ..Entry::default()
            }
        );
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let store = MemoryStore::new()
            .with_key(&format!(r"{}\A", ROOT), [("Unrelated", RegValue::from("x"))])
            .unwrap();
        let serializer = serializer(store);
        assert_eq!(serializer.deserialize::<Entry>(&format!(r"{}\A", ROOT)), None);
        assert_eq!(serializer.deserialize::<Entry>(&format!(r"{}\Missing", ROOT)), None);
    }

    #[test]
    fn test_alternate_name_and_post_process() {
        let store = MemoryStore::new()
            .with_key(&format!(r"{}\A", ROOT), [("Size", RegValue::DWord(2))])
            .unwrap();
        let entry: Entry = serializer(store).deserialize(&format!(r"{}\A", ROOT)).unwrap();
        assert_eq!(entry.size, Some(2000));
    }

    #[test]
    fn test_first_name_wins() {
        let store = MemoryStore::new()
            .with_key(
                &format!(r"{}\A", ROOT),
                [
                    ("EstimatedSize", RegValue::DWord(1)),
                    ("Size", RegValue::DWord(9)),
                ],
            )
            .unwrap();
        let entry: Entry = serializer(store).deserialize(&format!(r"{}\A", ROOT)).unwrap();
        assert_eq!(entry.size, Some(1000));
    }

    #[test]
    fn test_bad_value_falls_through_to_next_name() {
        let store = MemoryStore::new()
            .with_key(
                &format!(r"{}\A", ROOT),
                [
                    ("EstimatedSize", RegValue::from("lots")),
                    ("Size", RegValue::DWord(3)),
                ],
            )
            .unwrap();
        let entry: Entry = serializer(store).deserialize(&format!(r"{}\A", ROOT)).unwrap();
        assert_eq!(entry.size, Some(3000));
    }

    #[test]
    fn test_strict_mode_surfaces_field_errors() {
        let store = MemoryStore::new()
            .with_key(
                &format!(r"{}\A", ROOT),
                [
                    ("Name", RegValue::from("Foo")),
                    ("Flag", RegValue::from("maybe")),
                ],
            )
            .unwrap();
        let serializer = serializer(store);
        let key = format!(r"{}\A", ROOT);

        let lenient: Entry = serializer.deserialize(&key).unwrap();
        assert!(!lenient.flag);

        let err = serializer.try_deserialize::<Entry>(&key).unwrap_err();
        assert!(err.is_field_level());
    }

    #[test]
    fn test_declared_converter_overrides_chain() {
        #[derive(Debug)]
        struct Reversed;
        impl RegistryConverter for Reversed {
            fn can_convert(&self, kind: FieldKind) -> bool {
                kind == FieldKind::String
            }
            fn try_read(&self, raw: &RegValue, _kind: FieldKind) -> Result<Option<FieldValue>> {
                Ok(Some(FieldValue::String(raw.to_string().chars().rev().collect())))
            }
        }

        #[derive(Debug, Default)]
        struct Reversing {
            name: Option<String>,
        }
        impl RegistryRecord for Reversing {
            fn mappings() -> Vec<PropertyMapping<Self>> {
                vec![PropertyMapping::<Self>::string(
                    "Name",
                    |r, v| r.name = Some(v),
                    |r| r.name.as_deref(),
                )
                .converter(Arc::new(Reversed))]
            }
        }

        let store = MemoryStore::new()
            .with_key(&format!(r"{}\A", ROOT), [("Name", RegValue::from("abc"))])
            .unwrap();
        let record: Reversing = serializer(store).deserialize(&format!(r"{}\A", ROOT)).unwrap();
        assert_eq!(record.name.as_deref(), Some("cba"));
    }

    #[test]
    fn test_deserialize_is_repeatable() {
        let store = MemoryStore::new()
            .with_key(
                &format!(r"{}\A", ROOT),
                [("Name", RegValue::from("Foo")), ("Major", RegValue::DWord(4))],
            )
            .unwrap();
        let serializer = serializer(store);
        let key = format!(r"{}\A", ROOT);
        let first: Entry = serializer.deserialize(&key).unwrap();
        let second: Entry = serializer.deserialize(&key).unwrap();
        assert_eq!(first, second);
        assert_eq!(serializer.cache().len(), 1);
    }

    #[test]
    fn test_deserialize_directory() {
        let store = MemoryStore::new()
            .with_key(&format!(r"{}\A", ROOT), [("Name", RegValue::from("A"))])
            .unwrap()
            .with_key(&format!(r"{}\B", ROOT), [("Other", RegValue::from("x"))])
            .unwrap()
            .with_key(&format!(r"{}\C", ROOT), [("Name", RegValue::from("C"))])
            .unwrap();
        let serializer = serializer(store);
        let names: Vec<_> = serializer
            .deserialize_directory::<Entry>(ROOT)
            .unwrap()
            .into_iter()
            .filter_map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["A".to_string(), "C".to_string()]);
        assert!(serializer.deserialize_directory::<Entry>(r"HKLM\Nowhere").is_none());
    }

    #[tokio::test]
    async fn test_deserialize_directory_async_keeps_order() {
        let mut store = MemoryStore::new();
        for i in 0..20 {
            store = store
                .with_key(
                    &format!(r"{}\Key{:02}", ROOT, i),
                    [("Major", RegValue::DWord(i))],
                )
                .unwrap();
        }
        let records = serializer(store)
            .deserialize_directory_async::<Entry>(ROOT)
            .await
            .unwrap();
        let majors: Vec<_> = records.iter().filter_map(|e| e.major).collect();
        assert_eq!(majors, (0..20).collect::<Vec<i32>>());
    }

    #[test]
    fn test_serialize_writes_known_fields() {
        let serializer = serializer(MemoryStore::new());
        let entry = Entry {
            name: Some("Foo".into()),
            size: Some(5000),
            flag: true,
            major: None,
        };
        let key = format!(r"{}\Written", ROOT);
        assert_eq!(serializer.serialize(&entry, &key).unwrap(), 3);

        let store = serializer.store();
        assert_eq!(store.get_value(&key, "EstimatedSize").unwrap(), Some(RegValue::DWord(5)));
        assert_eq!(store.get_value(&key, "Major").unwrap(), None);

        let back: Entry = serializer.deserialize(&key).unwrap();
        assert_eq!(back, entry);
    }
}
