//! Typed field values produced by converters.

use crate::error::{ProgInfoError, Result};
use crate::registry::RegValue;
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Target type of a mapped field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Int,
    Long,
    Bool,
    DateTime,
    Version,
}

/// A converted value, ready to be assigned to a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    String(String),
    Int(i32),
    Long(i64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Version(Version),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::String(_) => FieldKind::String,
            FieldValue::Int(_) => FieldKind::Int,
            FieldValue::Long(_) => FieldKind::Long,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::DateTime(_) => FieldKind::DateTime,
            FieldValue::Version(_) => FieldKind::Version,
        }
    }

    /// Raw representation written back to a key-value store.
    ///
    /// Integers and flags become DWORDs (QWORD for 64-bit values), dates the
    /// compact `yyyyMMdd` string the registry conventionally uses.
    pub fn to_raw(&self) -> RegValue {
        match self {
            FieldValue::String(s) => RegValue::String(s.clone()),
            FieldValue::Int(v) => RegValue::DWord(*v as u32),
            FieldValue::Long(v) => RegValue::QWord(*v as u64),
            FieldValue::Bool(v) => RegValue::DWord(u32::from(*v)),
            FieldValue::DateTime(v) => RegValue::String(v.format("%Y%m%d").to_string()),
            FieldValue::Version(v) => RegValue::String(v.to_string()),
        }
    }
}

/// A `major.minor[.build[.revision]]` version number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub build: Option<u32>,
    pub revision: Option<u32>,
}

impl Version {
    pub fn new(major: u32, minor: u32, build: Option<u32>, revision: Option<u32>) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }

    /// Unpack a version stored as one 32-bit integer, one byte per part
    /// from the most significant byte down.
    pub fn from_packed(packed: u32) -> Self {
        Self {
            major: packed >> 24,
            minor: (packed >> 16) & 0xFF,
            build: Some((packed >> 8) & 0xFF),
            revision: Some(packed & 0xFF),
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(build) = self.build {
            write!(f, ".{}", build)?;
            if let Some(revision) = self.revision {
                write!(f, ".{}", revision)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ProgInfoError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || ProgInfoError::conversion("Version", format!("invalid version '{}'", s));
        let parts = s
            .trim()
            .split('.')
            .map(|part| part.trim().parse::<u32>())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| invalid())?;

        match parts.as_slice() {
            [major, minor] => Ok(Version::new(*major, *minor, None, None)),
            [major, minor, build] => Ok(Version::new(*major, *minor, Some(*build), None)),
            [major, minor, build, revision] => {
                Ok(Version::new(*major, *minor, Some(*build), Some(*revision)))
            }
            _ => Err(invalid()),
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
