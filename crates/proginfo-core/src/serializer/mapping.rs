//! Declarative per-type field tables.

use super::converter::RegistryConverter;
use super::value::{FieldKind, FieldValue, Version};
use crate::error::{ProgInfoError, Result};
use crate::registry::RegValue;
use chrono::NaiveDateTime;
use std::fmt;
use std::sync::Arc;

/// Transform applied to a converted value before it is assigned.
pub trait PostProcess: Send + Sync + fmt::Debug {
    fn apply(&self, value: FieldValue) -> Result<FieldValue>;

    /// Inverse of [`apply`](Self::apply), producing the raw value to store.
    fn revert(&self, value: &FieldValue) -> Result<RegValue> {
        Ok(value.to_raw())
    }
}

/// Estimated sizes are stored in kilobytes as an unsigned DWORD.
#[derive(Debug, Default, Clone, Copy)]
pub struct EstimatedSizePostProcess;

impl PostProcess for EstimatedSizePostProcess {
    fn apply(&self, value: FieldValue) -> Result<FieldValue> {
        match value {
            FieldValue::Long(v) => Ok(FieldValue::Long(i64::from(v as u32) * 1000)),
            FieldValue::Int(v) => Ok(FieldValue::Long(i64::from(v as u32) * 1000)),
            other => Err(ProgInfoError::conversion(
                "EstimatedSize",
                format!("expected an integer, got {:?}", other.kind()),
            )),
        }
    }

    fn revert(&self, value: &FieldValue) -> Result<RegValue> {
        match value {
            // Rounded up so a non-empty size never reads back as zero.
            FieldValue::Long(v) => {
                let kilobytes = u64::try_from(*v).unwrap_or(0).div_ceil(1000);
                Ok(RegValue::DWord(u32::try_from(kilobytes).unwrap_or(u32::MAX)))
            }
            other => Err(ProgInfoError::conversion(
                "EstimatedSize",
                format!("expected an integer, got {:?}", other.kind()),
            )),
        }
    }
}

type Setter<T> = Arc<dyn Fn(&mut T, FieldValue) -> Result<()> + Send + Sync>;
type Getter<T> = Arc<dyn Fn(&T) -> Option<FieldValue> + Send + Sync>;

/// How one record field maps onto registry values.
///
/// The getter returns `None` while the field still holds its "unknown"
/// default; such fields are not written back.
pub struct PropertyMapping<T> {
    field: &'static str,
    names: Vec<&'static str>,
    kind: FieldKind,
    converter: Option<Arc<dyn RegistryConverter>>,
    post_process: Option<Arc<dyn PostProcess>>,
    ignored: bool,
    setter: Option<Setter<T>>,
    getter: Option<Getter<T>>,
}

impl<T> fmt::Debug for PropertyMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMapping")
            .field("field", &self.field)
            .field("names", &self.names)
            .field("kind", &self.kind)
            .field("converter", &self.converter)
            .field("post_process", &self.post_process)
            .field("ignored", &self.ignored)
            .finish()
    }
}

fn mismatch(field: &str, expected: FieldKind, got: &FieldValue) -> ProgInfoError {
    ProgInfoError::conversion(
        field,
        format!("expected {:?}, got {:?}", expected, got.kind()),
    )
}

impl<T: 'static> PropertyMapping<T> {
    fn with_accessors(
        field: &'static str,
        kind: FieldKind,
        setter: Setter<T>,
        getter: Getter<T>,
    ) -> Self {
        Self {
            field,
            names: vec![field],
            kind,
            converter: None,
            post_process: None,
            ignored: false,
            setter: Some(setter),
            getter: Some(getter),
        }
    }

    pub fn string(field: &'static str, set: fn(&mut T, String), get: fn(&T) -> Option<&str>) -> Self {
        Self::with_accessors(
            field,
            FieldKind::String,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::String(s) => {
                    set(record, s);
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::String, &other)),
            }),
            Arc::new(move |record: &T| {
                get(record)
                    .filter(|s| !s.is_empty())
                    .map(|s| FieldValue::String(s.to_string()))
            }),
        )
    }

    pub fn int(field: &'static str, set: fn(&mut T, i32), get: fn(&T) -> Option<i32>) -> Self {
        Self::with_accessors(
            field,
            FieldKind::Int,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::Int(v) => {
                    set(record, v);
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::Int, &other)),
            }),
            Arc::new(move |record: &T| get(record).map(FieldValue::Int)),
        )
    }

    pub fn long(field: &'static str, set: fn(&mut T, i64), get: fn(&T) -> Option<i64>) -> Self {
        Self::with_accessors(
            field,
            FieldKind::Long,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::Long(v) => {
                    set(record, v);
                    Ok(())
                }
                FieldValue::Int(v) => {
                    set(record, i64::from(v));
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::Long, &other)),
            }),
            Arc::new(move |record: &T| get(record).map(FieldValue::Long)),
        )
    }

    pub fn bool(field: &'static str, set: fn(&mut T, bool), get: fn(&T) -> bool) -> Self {
        Self::with_accessors(
            field,
            FieldKind::Bool,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::Bool(v) => {
                    set(record, v);
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::Bool, &other)),
            }),
            Arc::new(move |record: &T| Some(FieldValue::Bool(get(record)))),
        )
    }

    pub fn date_time(
        field: &'static str,
        set: fn(&mut T, NaiveDateTime),
        get: fn(&T) -> Option<NaiveDateTime>,
    ) -> Self {
        Self::with_accessors(
            field,
            FieldKind::DateTime,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::DateTime(v) => {
                    set(record, v);
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::DateTime, &other)),
            }),
            Arc::new(move |record: &T| get(record).map(FieldValue::DateTime)),
        )
    }

    pub fn version(field: &'static str, set: fn(&mut T, Version), get: fn(&T) -> Option<Version>) -> Self {
        Self::with_accessors(
            field,
            FieldKind::Version,
            Arc::new(move |record: &mut T, value: FieldValue| match value {
                FieldValue::Version(v) => {
                    set(record, v);
                    Ok(())
                }
                other => Err(mismatch(field, FieldKind::Version, &other)),
            }),
            Arc::new(move |record: &T| get(record).map(FieldValue::Version)),
        )
    }

    /// A field the mapper never reads or writes.
    pub fn ignored(field: &'static str) -> Self {
        Self {
            field,
            names: vec![field],
            kind: FieldKind::String,
            converter: None,
            post_process: None,
            ignored: true,
            setter: None,
            getter: None,
        }
    }

    /// Candidate value names, tried in order.
    pub fn names(mut self, names: &[&'static str]) -> Self {
        if !names.is_empty() {
            self.names = names.to_vec();
        }
        self
    }

    pub fn converter(mut self, converter: Arc<dyn RegistryConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    pub fn post_process(mut self, post_process: Arc<dyn PostProcess>) -> Self {
        self.post_process = Some(post_process);
        self
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn candidate_names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn converter_override(&self) -> Option<&Arc<dyn RegistryConverter>> {
        self.converter.as_ref()
    }

    pub fn post_processor(&self) -> Option<&Arc<dyn PostProcess>> {
        self.post_process.as_ref()
    }

    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    pub(crate) fn assign(&self, record: &mut T, value: FieldValue) -> Result<()> {
        match &self.setter {
            Some(set) => set(record, value),
            None => Err(ProgInfoError::conversion(self.field, "field is not mapped")),
        }
    }

    /// The field's known value, or `None` if it is unknown or unmapped.
    pub fn read(&self, record: &T) -> Option<FieldValue> {
        self.getter.as_ref().and_then(|get| get(record))
    }
}

/// A type the registry mapper can build.
pub trait RegistryRecord: Default + Send + Sync + 'static {
    /// Field table, in mapping order.
    fn mappings() -> Vec<PropertyMapping<Self>>;
}
