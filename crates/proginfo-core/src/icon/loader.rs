//! Pick and extract the image a reference points at.

use super::codec::{IconCodec, IconContainer};
use super::ico::IcoCodec;
use super::reference::IconReference;
use crate::config::IconConfig;
use crate::naming::contains_generalized;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Loads icon images through an [`IconCodec`].
#[derive(Clone)]
pub struct IconLoader {
    codec: Arc<dyn IconCodec>,
}

impl std::fmt::Debug for IconLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IconLoader").finish_non_exhaustive()
    }
}

impl Default for IconLoader {
    fn default() -> Self {
        Self::new(Arc::new(IcoCodec))
    }
}

impl IconLoader {
    pub fn new(codec: Arc<dyn IconCodec>) -> Self {
        Self { codec }
    }

    /// Image bytes for `reference`, as a single-image `.ico` file.
    ///
    /// `None` when the container cannot be read or holds no usable image.
    pub fn load(&self, reference: &IconReference) -> Option<Vec<u8>> {
        if reference.path.as_os_str().is_empty() {
            return None;
        }
        if is_plain_image(&reference.path) {
            return match std::fs::read(&reference.path) {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    warn!("Failed to read image {}: {}", reference.path.display(), e);
                    None
                }
            };
        }
        let container = match self.codec.read(&reference.path) {
            Ok(Some(container)) => container,
            Ok(None) => {
                debug!("No icon codec for {}", reference.path.display());
                return None;
            }
            Err(e) => {
                warn!("Failed to read icon {}: {}", reference.path.display(), e);
                return None;
            }
        };

        let index = select_image(&container, reference)?;
        container.image(index).map(|image| image.to_ico_bytes())
    }
}

fn is_plain_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IconConfig::IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// Slot of the image to use for `reference`.
///
/// An explicit index selects its group, an explicit group name selects that
/// group; otherwise a group named like a main icon or logo wins over the
/// container's overall best image.
pub fn select_image(container: &IconContainer, reference: &IconReference) -> Option<usize> {
    let explicit_group = reference
        .group_name
        .as_deref()
        .filter(|name| !name.is_empty());

    if reference.index != -1 {
        let slot = usize::try_from(reference.index)
            .ok()
            .filter(|slot| *slot < container.images.len());
        if let Some(slot) = slot {
            let group = match explicit_group {
                Some(name) => Some(name.to_string()),
                None => container.group_of_image(slot).map(|group| group.name.clone()),
            };
            if let Some(index) = container.preferred_image_index(group.as_deref()) {
                return Some(index);
            }
        } else if let Some(name) = explicit_group {
            if let Some(index) = container.preferred_image_index(Some(name)) {
                return Some(index);
            }
        }
    }

    let main_group = container.groups.iter().find(|group| {
        IconConfig::GROUP_HINT_TOKENS
            .iter()
            .any(|token| contains_generalized(&group.name, token))
    });
    match main_group {
        Some(group) => container.preferred_image_index(Some(&group.name)),
        None => container.preferred_image_index(None),
    }
}
