//! Built-in value converters.
//!
//! A converter turns one raw registry value into a typed [`FieldValue`].
//! `Ok(None)` means the value could not be converted; `Err` is reserved for
//! conversions that fail loudly and is swallowed or surfaced by the mapper
//! depending on its options.

use super::value::{FieldKind, FieldValue, Version};
use crate::error::Result;
use crate::registry::RegValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;
use std::sync::LazyLock;

/// Converts raw registry values into one or more field kinds.
pub trait RegistryConverter: Send + Sync + fmt::Debug {
    /// Whether this converter handles `kind`.
    fn can_convert(&self, kind: FieldKind) -> bool;

    /// Convert `raw` into a value of `kind`.
    fn try_read(&self, raw: &RegValue, kind: FieldKind) -> Result<Option<FieldValue>>;
}

/// Stringifies any raw value.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringConverter;

impl RegistryConverter for StringConverter {
    fn can_convert(&self, kind: FieldKind) -> bool {
        kind == FieldKind::String
    }

    fn try_read(&self, raw: &RegValue, _kind: FieldKind) -> Result<Option<FieldValue>> {
        Ok(Some(FieldValue::String(raw.to_string())))
    }
}

/// 32-bit integers from DWORDs, falling back to parsing the text form.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntConverter;

impl RegistryConverter for IntConverter {
    fn can_convert(&self, kind: FieldKind) -> bool {
        kind == FieldKind::Int
    }

    fn try_read(&self, raw: &RegValue, _kind: FieldKind) -> Result<Option<FieldValue>> {
        if let RegValue::DWord(v) = raw {
            return Ok(Some(FieldValue::Int(*v as i32)));
        }
        Ok(raw.to_string().trim().parse::<i32>().ok().map(FieldValue::Int))
    }
}

/// Fixed date patterns tried when the input has exactly the pattern's length.
const DATE_PATTERNS: [&str; 30] = [
    "M/d/yyyy", "MM/dd/yyyy", "d/M/yyyy", "dd/MM/yyyy", "yyyy/M/d", "yyyy/MM/dd",
    "M-d-yyyy", "MM-dd-yyyy", "d-M-yyyy", "dd-MM-yyyy", "yyyy-M-d", "yyyy-MM-dd",
    "M.d.yyyy", "MM.dd.yyyy", "d.M.yyyy", "dd.MM.yyyy", "yyyy.M.d", "yyyy.MM.dd",
    "M,d,yyyy", "MM,dd,yyyy", "d,M,yyyy", "dd,MM,yyyy", "yyyy,M,d", "yyyy,MM,dd",
    "M d yyyy", "MM dd yyyy", "d M yyyy", "dd MM yyyy", "yyyy M d", "yyyy MM dd",
];

/// `DATE_PATTERNS` paired with their chrono equivalents.
static FIXED_DATE_FORMATS: LazyLock<Vec<(usize, String)>> = LazyLock::new(|| {
    DATE_PATTERNS
        .iter()
        .map(|pattern| (pattern.len(), to_chrono_format(pattern)))
        .collect()
});

/// Loose formats tried last, date-and-time first.
const FALLBACK_DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
];

const FALLBACK_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%b %d, %Y",
    "%d %b %Y",
];

fn to_chrono_format(pattern: &str) -> String {
    let mut out = String::new();
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            'y' | 'M' | 'd' => {
                while chars.peek() == Some(&c) {
                    chars.next();
                }
                out.push_str(match c {
                    'y' => "%Y",
                    'M' => "%m",
                    _ => "%d",
                });
            }
            other => out.push(other),
        }
    }
    out
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

/// Parse an install date as written by the many installers out there.
pub fn parse_install_date(input: &str) -> Option<NaiveDateTime> {
    let input = input.trim();

    if input.len() == 8 && input.bytes().all(|b| b.is_ascii_digit()) {
        if let Some(date) = NaiveDate::parse_from_str(input, "%Y%m%d").ok().and_then(midnight) {
            return Some(date);
        }
    }

    for (len, format) in FIXED_DATE_FORMATS.iter() {
        if *len == input.len() {
            if let Some(date) = NaiveDate::parse_from_str(input, format).ok().and_then(midnight) {
                return Some(date);
            }
        }
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.naive_utc());
    }
    if let Ok(date) = DateTime::parse_from_rfc2822(input) {
        return Some(date.naive_utc());
    }
    for format in FALLBACK_DATE_TIME_FORMATS {
        if let Ok(date) = NaiveDateTime::parse_from_str(input, format) {
            return Some(date);
        }
    }
    FALLBACK_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(input, format).ok())
        .and_then(midnight)
}

/// Dates: compact `yyyyMMdd`, then the fixed patterns, then a loose parse.
#[derive(Debug, Default, Clone, Copy)]
pub struct DateTimeConverter;

impl RegistryConverter for DateTimeConverter {
    fn can_convert(&self, kind: FieldKind) -> bool {
        kind == FieldKind::DateTime
    }

    fn try_read(&self, raw: &RegValue, _kind: FieldKind) -> Result<Option<FieldValue>> {
        Ok(parse_install_date(&raw.to_string()).map(FieldValue::DateTime))
    }
}

/// Versions: numbers unpack as a packed 32-bit version, text parses as
/// `major.minor[.build[.revision]]`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionConverter;

impl RegistryConverter for VersionConverter {
    fn can_convert(&self, kind: FieldKind) -> bool {
        kind == FieldKind::Version
    }

    fn try_read(&self, raw: &RegValue, _kind: FieldKind) -> Result<Option<FieldValue>> {
        let version = match raw {
            RegValue::DWord(v) => Some(Version::from_packed(*v)),
            RegValue::String(s) | RegValue::ExpandString(s) => match s.trim().parse::<i32>() {
                Ok(packed) => Some(Version::from_packed(packed as u32)),
                Err(_) => s.parse::<Version>().ok(),
            },
            _ => None,
        };
        Ok(version.map(FieldValue::Version))
    }
}
