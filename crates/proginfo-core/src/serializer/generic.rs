//! Fallback converter for kinds no registered converter claims.
//!
//! A direct coercion of the raw value is tried first. Failing that, either a
//! constructor taking the raw value or a strict parse of its text (which
//! fails loudly) applies. The choice depends only on the target kind and the
//! raw value kind, so it is resolved once per pair and cached.

use super::converter::{parse_install_date, RegistryConverter};
use super::value::{FieldKind, FieldValue, Version};
use crate::error::{ProgInfoError, Result};
use crate::registry::{RegValue, RegValueKind};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

/// Conversion strategy chosen after direct coercion fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertStrategy {
    /// Build the target from the raw value itself.
    Construct,
    /// Parse the text form; bad input is an error.
    Parse,
}

/// Catch-all converter with a per-(target kind, raw kind) strategy cache.
#[derive(Debug, Default)]
pub struct GenericConverter {
    strategies: RwLock<HashMap<(FieldKind, RegValueKind), Option<ConvertStrategy>>>,
}

impl GenericConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strategy cached for a pair, if it has been resolved yet.
    pub fn cached_strategy(
        &self,
        kind: FieldKind,
        raw_kind: RegValueKind,
    ) -> Option<Option<ConvertStrategy>> {
        self.strategies
            .read()
            .ok()
            .and_then(|cache| cache.get(&(kind, raw_kind)).copied())
    }

    fn strategy(&self, kind: FieldKind, raw_kind: RegValueKind) -> Option<ConvertStrategy> {
        if let Some(cached) = self.cached_strategy(kind, raw_kind) {
            return cached;
        }

        let resolved = resolve_strategy(kind, raw_kind);
        debug!(
            "Resolved {:?} strategy for {:?} from {}",
            resolved, kind, raw_kind
        );
        // A poisoned cache only costs re-resolution.
        if let Ok(mut cache) = self.strategies.write() {
            cache.entry((kind, raw_kind)).or_insert(resolved);
        }
        resolved
    }
}

impl RegistryConverter for GenericConverter {
    fn can_convert(&self, _kind: FieldKind) -> bool {
        true
    }

    fn try_read(&self, raw: &RegValue, kind: FieldKind) -> Result<Option<FieldValue>> {
        if let Some(value) = coerce(raw, kind) {
            return Ok(Some(value));
        }

        match self.strategy(kind, raw.kind()) {
            Some(ConvertStrategy::Construct) => construct(raw, kind),
            Some(ConvertStrategy::Parse) => parse(&raw.to_string(), kind).map(Some),
            None => Ok(None),
        }
    }
}

fn resolve_strategy(kind: FieldKind, raw_kind: RegValueKind) -> Option<ConvertStrategy> {
    let textual = matches!(raw_kind, RegValueKind::String | RegValueKind::ExpandString);
    match kind {
        FieldKind::Version if textual => Some(ConvertStrategy::Construct),
        FieldKind::DateTime if raw_kind == RegValueKind::QWord => Some(ConvertStrategy::Construct),
        FieldKind::String => None,
        _ => Some(ConvertStrategy::Parse),
    }
}

/// Direct coercion between compatible representations.
fn coerce(raw: &RegValue, kind: FieldKind) -> Option<FieldValue> {
    match (kind, raw) {
        (FieldKind::String, raw) => Some(FieldValue::String(raw.to_string())),
        (FieldKind::Int, RegValue::DWord(v)) => Some(FieldValue::Int(*v as i32)),
        (FieldKind::Int, RegValue::QWord(v)) => i32::try_from(*v as i64).ok().map(FieldValue::Int),
        (FieldKind::Long, RegValue::DWord(_) | RegValue::QWord(_)) => {
            raw.as_integer().map(FieldValue::Long)
        }
        (FieldKind::Bool, RegValue::DWord(_) | RegValue::QWord(_)) => {
            raw.as_integer().map(|v| FieldValue::Bool(v != 0))
        }
        (FieldKind::Int | FieldKind::Long | FieldKind::Bool, RegValue::String(s))
        | (FieldKind::Int | FieldKind::Long | FieldKind::Bool, RegValue::ExpandString(s)) => {
            parse(s, kind).ok()
        }
        _ => None,
    }
}

/// Build a value directly from a raw value.
fn construct(raw: &RegValue, kind: FieldKind) -> Result<Option<FieldValue>> {
    match (kind, raw) {
        (FieldKind::Version, raw) => match raw.as_str() {
            Some(text) => text.parse::<Version>().map(|v| Some(FieldValue::Version(v))),
            None => Ok(None),
        },
        (FieldKind::DateTime, RegValue::QWord(ticks)) => from_ticks(*ticks)
            .map(|v| Some(FieldValue::DateTime(v)))
            .ok_or_else(|| ProgInfoError::conversion("DateTime", format!("tick count {} out of range", ticks))),
        _ => Ok(None),
    }
}

/// Timestamps stored as 100 ns ticks since 0001-01-01.
fn from_ticks(ticks: u64) -> Option<NaiveDateTime> {
    let epoch = NaiveDate::from_ymd_opt(1, 1, 1)?.and_hms_opt(0, 0, 0)?;
    let micros = i64::try_from(ticks / 10).ok()?;
    epoch.checked_add_signed(TimeDelta::microseconds(micros))
}

/// Strict parse of a text value into `kind`.
fn parse(text: &str, kind: FieldKind) -> Result<FieldValue> {
    let trimmed = text.trim();
    let fail = |what: &str| {
        ProgInfoError::conversion(format!("{:?}", kind), format!("cannot parse '{}' as {}", text, what))
    };
    match kind {
        FieldKind::String => Ok(FieldValue::String(text.to_string())),
        FieldKind::Int => trimmed
            .parse::<i32>()
            .map(FieldValue::Int)
            .map_err(|_| fail("a 32-bit integer")),
        FieldKind::Long => trimmed
            .parse::<i64>()
            .map(FieldValue::Long)
            .map_err(|_| fail("a 64-bit integer")),
        FieldKind::Bool => {
            if trimmed.eq_ignore_ascii_case("true") {
                Ok(FieldValue::Bool(true))
            } else if trimmed.eq_ignore_ascii_case("false") {
                Ok(FieldValue::Bool(false))
            } else {
                Err(fail("a boolean"))
            }
        }
        FieldKind::DateTime => parse_install_date(trimmed)
            .map(FieldValue::DateTime)
            .ok_or_else(|| fail("a date")),
        FieldKind::Version => trimmed.parse::<Version>().map(FieldValue::Version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_numeric_kinds() {
        let converter = GenericConverter::new();
        assert_eq!(
            converter.try_read(&RegValue::DWord(0xFFFF_FFFF), FieldKind::Long).unwrap(),
            Some(FieldValue::Long(-1))
        );
        assert_eq!(
            converter.try_read(&RegValue::DWord(1), FieldKind::Bool).unwrap(),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(
            converter.try_read(&RegValue::from("123"), FieldKind::Long).unwrap(),
            Some(FieldValue::Long(123))
        );
        // Coercion succeeded, so nothing was resolved.
        assert_eq!(
            converter.cached_strategy(FieldKind::Long, RegValueKind::String),
            None
        );
    }

    #[test]
    fn test_parse_strategy_fails_loudly() {
        let converter = GenericConverter::new();
        let result = converter.try_read(&RegValue::from("yes"), FieldKind::Bool);
        assert!(result.is_err());
        assert_eq!(
            converter.cached_strategy(FieldKind::Bool, RegValueKind::String),
            Some(Some(ConvertStrategy::Parse))
        );
    }

    #[test]
    fn test_construct_version_from_text() {
        let converter = GenericConverter::new();
        assert_eq!(
            converter.try_read(&RegValue::from("2.5"), FieldKind::Version).unwrap(),
            Some(FieldValue::Version(Version::new(2, 5, None, None)))
        );
        assert!(converter
            .try_read(&RegValue::from("garbage"), FieldKind::Version)
            .is_err());
        assert_eq!(
            converter.cached_strategy(FieldKind::Version, RegValueKind::String),
            Some(Some(ConvertStrategy::Construct))
        );
    }

    #[test]
    fn test_construct_date_from_ticks() {
        // 2023-01-15T00:00:00 in 100 ns ticks.
        let ticks = 638_093_376_000_000_000u64;
        let value = GenericConverter::new()
            .try_read(&RegValue::QWord(ticks), FieldKind::DateTime)
            .unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(value, Some(FieldValue::DateTime(expected)));
    }

    #[test]
    fn test_resolve_strategy_per_kind() {
        assert_eq!(resolve_strategy(FieldKind::String, RegValueKind::Binary), None);
        assert_eq!(resolve_strategy(FieldKind::Version, RegValueKind::ExpandString), Some(ConvertStrategy::Construct));
        assert_eq!(resolve_strategy(FieldKind::Version, RegValueKind::DWord), Some(ConvertStrategy::Parse));
        assert_eq!(resolve_strategy(FieldKind::DateTime, RegValueKind::QWord), Some(ConvertStrategy::Construct));
        for kind in [FieldKind::Int, FieldKind::Long, FieldKind::Bool, FieldKind::DateTime] {
            assert_eq!(resolve_strategy(kind, RegValueKind::MultiString), Some(ConvertStrategy::Parse));
        }
    }

    #[test]
    fn test_binary_to_int_parse_error() {
        let converter = GenericConverter::new();
        assert!(converter
            .try_read(&RegValue::Binary(vec![0xab]), FieldKind::Int)
            .is_err());
    }
}
