//! `.ico` file codec.

use super::codec::{IconCodec, IconContainer, IconGroup, IconGroupEntry, IconImage};
use crate::error::{ProgInfoError, Result};
use std::fs;
use std::path::Path;

const ICONDIR_LEN: usize = 6;
const ICONDIRENTRY_LEN: usize = 16;
const ICON_TYPE: u16 = 1;

/// Decodes Windows `.ico` files into a single group named `"1"`.
///
/// Other containers (executables, DLLs) are not understood and read as
/// `Ok(None)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct IcoCodec;

fn u16_at(bytes: &[u8], at: usize) -> Option<u16> {
    bytes.get(at..at + 2).map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32_at(bytes: &[u8], at: usize) -> Option<u32> {
    bytes
        .get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

impl IcoCodec {
    /// Decode an in-memory `.ico` file.
    pub fn decode(bytes: &[u8]) -> Result<Option<IconContainer>> {
        if u16_at(bytes, 0) != Some(0) || u16_at(bytes, 2) != Some(ICON_TYPE) {
            return Ok(None);
        }
        let count = u16_at(bytes, 4).unwrap_or(0) as usize;
        let truncated = |what: &str| ProgInfoError::Other(format!("Truncated icon file: {}", what));

        let mut images = Vec::with_capacity(count);
        let mut entries = Vec::with_capacity(count);
        for slot in 0..count {
            let at = ICONDIR_LEN + slot * ICONDIRENTRY_LEN;
            let entry = bytes
                .get(at..at + ICONDIRENTRY_LEN)
                .ok_or_else(|| truncated("directory"))?;
            let dimension = |b: u8| if b == 0 { 256 } else { u32::from(b) };
            let width = dimension(entry[0]);
            let height = dimension(entry[1]);
            let bit_count = u16_at(entry, 6).unwrap_or(0);
            let size = u32_at(entry, 8).unwrap_or(0) as usize;
            let offset = u32_at(entry, 12).unwrap_or(0);

            let start = offset as usize;
            let data = bytes
                .get(start..start.saturating_add(size))
                .ok_or_else(|| truncated("image data"))?
                .to_vec();

            entries.push(IconGroupEntry {
                width,
                height,
                bit_count,
                image_offset: offset,
            });
            images.push(IconImage {
                offset,
                width,
                height,
                bit_count,
                data,
            });
        }

        Ok(Some(IconContainer {
            images,
            groups: vec![IconGroup {
                name: "1".to_string(),
                entries,
            }],
        }))
    }
}

impl IconCodec for IcoCodec {
    fn read(&self, path: &Path) -> Result<Option<IconContainer>> {
        let is_ico = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ico"));
        if !is_ico {
            return Ok(None);
        }
        let bytes = fs::read(path).map_err(|e| ProgInfoError::io_with_path(e, path))?;
        Self::decode(&bytes)
    }
}
