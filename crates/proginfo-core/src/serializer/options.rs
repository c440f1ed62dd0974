//! Mapper options and converter selection.

use super::converter::{
    DateTimeConverter, IntConverter, RegistryConverter, StringConverter, VersionConverter,
};
use super::generic::GenericConverter;
use super::value::FieldKind;
use std::sync::Arc;

/// Converter list and error policy for a [`RegistrySerializer`](super::RegistrySerializer).
#[derive(Debug, Clone)]
pub struct SerializerOptions {
    converters: Vec<Arc<dyn RegistryConverter>>,
    generic: Arc<GenericConverter>,
    /// Treat a converter error as "field not populated" instead of failing.
    pub ignore_thrown_exceptions: bool,
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self::empty()
            .with_converter(Arc::new(DateTimeConverter))
            .with_converter(Arc::new(IntConverter))
            .with_converter(Arc::new(StringConverter))
            .with_converter(Arc::new(VersionConverter))
    }
}

impl SerializerOptions {
    /// Options with no registered converters; every field goes through the
    /// generic fallback.
    pub fn empty() -> Self {
        Self {
            converters: Vec::new(),
            generic: Arc::new(GenericConverter::new()),
            ignore_thrown_exceptions: true,
        }
    }

    /// Register a converter after the existing ones.
    pub fn with_converter(mut self, converter: Arc<dyn RegistryConverter>) -> Self {
        self.converters.push(converter);
        self
    }

    pub fn strict(mut self) -> Self {
        self.ignore_thrown_exceptions = false;
        self
    }

    pub fn converters(&self) -> &[Arc<dyn RegistryConverter>] {
        &self.converters
    }

    pub fn generic(&self) -> &Arc<GenericConverter> {
        &self.generic
    }

    /// First registered converter claiming `kind`, else the generic one.
    pub fn converter_for(&self, kind: FieldKind) -> Arc<dyn RegistryConverter> {
        self.converters
            .iter()
            .find(|converter| converter.can_convert(kind))
            .cloned()
            .unwrap_or_else(|| self.generic.clone() as Arc<dyn RegistryConverter>)
    }
}
