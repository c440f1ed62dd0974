//! Registry-to-record mapping.
//!
//! A record type declares a field table ([`RegistryRecord::mappings`]); the
//! [`RegistrySerializer`] walks it once per key, trying each field's
//! candidate value names in order and converting raw values through the
//! converter chain configured in [`SerializerOptions`].

mod cache;
pub mod converter;
mod generic;
mod mapper;
mod mapping;
mod options;
mod value;

pub use cache::PropertyCache;
pub use converter::{
    DateTimeConverter, IntConverter, RegistryConverter, StringConverter, VersionConverter,
};
pub use generic::{ConvertStrategy, GenericConverter};
pub use mapper::RegistrySerializer;
pub use mapping::{EstimatedSizePostProcess, PostProcess, PropertyMapping, RegistryRecord};
pub use options::SerializerOptions;
pub use value::{FieldKind, FieldValue, Version};
