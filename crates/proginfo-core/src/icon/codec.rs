//! Icon container model and codec trait.

use crate::error::Result;
use std::path::Path;

/// One encoded image inside a container (PNG or a headerless DIB).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    /// Byte offset of the image inside the source file.
    pub offset: u32,
    pub width: u32,
    pub height: u32,
    pub bit_count: u16,
    pub data: Vec<u8>,
}

impl IconImage {
    /// Wrap this image into a standalone single-image `.ico` file.
    pub fn to_ico_bytes(&self) -> Vec<u8> {
        const HEADER_LEN: u32 = 6 + 16;
        let dimension = |v: u32| if v >= 256 { 0u8 } else { v as u8 };

        let mut out = Vec::with_capacity(HEADER_LEN as usize + self.data.len());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.push(dimension(self.width));
        out.push(dimension(self.height));
        out.push(0);
        out.push(0);
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&self.bit_count.to_le_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_le_bytes());
        out.extend_from_slice(&HEADER_LEN.to_le_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}

/// Directory entry of an icon group, pointing at an image by offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconGroupEntry {
    pub width: u32,
    pub height: u32,
    pub bit_count: u16,
    pub image_offset: u32,
}

/// A named set of alternative renderings of one icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconGroup {
    pub name: String,
    pub entries: Vec<IconGroupEntry>,
}

/// Decoded icon container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconContainer {
    pub images: Vec<IconImage>,
    pub groups: Vec<IconGroup>,
}

impl IconContainer {
    pub fn image(&self, index: usize) -> Option<&IconImage> {
        self.images.get(index)
    }

    pub fn group(&self, name: &str) -> Option<&IconGroup> {
        self.groups.iter().find(|group| group.name == name)
    }

    /// Group with an entry pointing at the image in slot `index`.
    pub fn group_of_image(&self, index: usize) -> Option<&IconGroup> {
        let offset = self.images.get(index)?.offset;
        self.groups
            .iter()
            .find(|group| group.entries.iter().any(|entry| entry.image_offset == offset))
    }

    /// Slot of the best image: largest area, then highest color depth.
    ///
    /// With a group name only that group's images are considered; an
    /// unknown group yields `None`.
    pub fn preferred_image_index(&self, group_name: Option<&str>) -> Option<usize> {
        let candidates: Vec<usize> = match group_name {
            Some(name) => {
                let group = self.group(name)?;
                group
                    .entries
                    .iter()
                    .filter_map(|entry| {
                        self.images
                            .iter()
                            .position(|image| image.offset == entry.image_offset)
                    })
                    .collect()
            }
            None => (0..self.images.len()).collect(),
        };

        candidates.into_iter().max_by_key(|&index| {
            let image = &self.images[index];
            (u64::from(image.width) * u64::from(image.height), image.bit_count)
        })
    }
}

/// Reads icon containers from disk.
pub trait IconCodec: Send + Sync {
    /// Decode the container at `path`. `Ok(None)` for formats this codec
    /// does not understand.
    fn read(&self, path: &Path) -> Result<Option<IconContainer>>;
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn image(offset: u32, size: u32, bit_count: u16) -> IconImage {
        IconImage {
            offset,
            width: size,
            height: size,
            bit_count,
            data: vec![offset as u8; 4],
        }
    }

    pub(crate) fn entry(of: &IconImage) -> IconGroupEntry {
        IconGroupEntry {
            width: of.width,
            height: of.height,
            bit_count: of.bit_count,
            image_offset: of.offset,
        }
    }

    pub(crate) fn sample_container() -> IconContainer {
        let images = vec![
            image(100, 16, 32),
            image(200, 48, 32),
            image(300, 32, 32),
            image(400, 256, 32),
            image(500, 64, 8),
            image(600, 64, 32),
        ];
        let groups = vec![
            IconGroup {
                name: "1".into(),
                entries: vec![entry(&images[0]), entry(&images[1])],
            },
            IconGroup {
                name: "MAINICON".into(),
                entries: vec![entry(&images[2]), entry(&images[3])],
            },
            IconGroup {
                name: "7".into(),
                entries: vec![entry(&images[4]), entry(&images[5])],
            },
        ];
        IconContainer { images, groups }
    }

    #[test]
    fn test_preferred_image_index() {
        let container = sample_container();
        assert_eq!(container.preferred_image_index(None), Some(3));
        assert_eq!(container.preferred_image_index(Some("1")), Some(1));
        assert_eq!(container.preferred_image_index(Some("7")), Some(5));
        assert_eq!(container.preferred_image_index(Some("missing")), None);
    }

    #[test]
    fn test_group_of_image() {
        let container = sample_container();
        assert_eq!(container.group_of_image(2).unwrap().name, "MAINICON");
        assert!(container.group_of_image(42).is_none());
        assert_eq!(container.image(1).unwrap().offset, 200);
    }

    #[test]
    fn test_to_ico_bytes_header() {
        let bytes = image(0, 256, 32).to_ico_bytes();
        assert_eq!(&bytes[..6], &[0, 0, 1, 0, 1, 0]);
        assert_eq!(bytes[6], 0);
        assert_eq!(bytes.len(), 22 + 4);
    }
}
