//! Typed raw registry values.

use std::fmt;

/// Value type tag, mirroring the registry's `REG_*` kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegValueKind {
    String,
    ExpandString,
    MultiString,
    DWord,
    QWord,
    Binary,
}

impl RegValueKind {
    /// Name as used by `reg.exe`.
    pub fn as_str(&self) -> &'static str {
        match self {
            RegValueKind::String => "REG_SZ",
            RegValueKind::ExpandString => "REG_EXPAND_SZ",
            RegValueKind::MultiString => "REG_MULTI_SZ",
            RegValueKind::DWord => "REG_DWORD",
            RegValueKind::QWord => "REG_QWORD",
            RegValueKind::Binary => "REG_BINARY",
        }
    }
}

impl fmt::Display for RegValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw value read from (or written to) a registry key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RegValue {
    String(String),
    ExpandString(String),
    MultiString(Vec<String>),
    DWord(u32),
    QWord(u64),
    Binary(Vec<u8>),
}

impl RegValue {
    pub fn kind(&self) -> RegValueKind {
        match self {
            RegValue::String(_) => RegValueKind::String,
            RegValue::ExpandString(_) => RegValueKind::ExpandString,
            RegValue::MultiString(_) => RegValueKind::MultiString,
            RegValue::DWord(_) => RegValueKind::DWord,
            RegValue::QWord(_) => RegValueKind::QWord,
            RegValue::Binary(_) => RegValueKind::Binary,
        }
    }

    /// Borrow the text of a string-typed value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RegValue::String(s) | RegValue::ExpandString(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view of a numeric value.
    ///
    /// DWORDs are read as signed 32-bit integers, the way the registry APIs
    /// surface them, so `0xFFFF_FFFF` becomes `-1`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            RegValue::DWord(v) => Some(i64::from(*v as i32)),
            RegValue::QWord(v) => Some(*v as i64),
            _ => None,
        }
    }
}

/// Stringification used by converters: text verbatim, numbers in decimal
/// (DWORDs signed), multi-strings newline-joined, binary as lowercase hex.
impl fmt::Display for RegValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegValue::String(s) | RegValue::ExpandString(s) => f.write_str(s),
            RegValue::MultiString(items) => f.write_str(&items.join("\n")),
            RegValue::DWord(v) => write!(f, "{}", *v as i32),
            RegValue::QWord(v) => write!(f, "{}", *v as i64),
            RegValue::Binary(bytes) => {
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for RegValue {
    fn from(value: &str) -> Self {
        RegValue::String(value.to_string())
    }
}

impl From<String> for RegValue {
    fn from(value: String) -> Self {
        RegValue::String(value)
    }
}

impl From<u32> for RegValue {
    fn from(value: u32) -> Self {
        RegValue::DWord(value)
    }
}

impl From<u64> for RegValue {
    fn from(value: u64) -> Self {
        RegValue::QWord(value)
    }
}
