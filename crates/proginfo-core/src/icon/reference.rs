//! Icon locations and the `path,index` notation used by `DisplayIcon`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a program's icon lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct IconReference {
    pub path: PathBuf,
    /// Image slot inside the container, `-1` when unset.
    pub index: i32,
    /// Icon group inside the container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_name: Option<String>,
}

impl Default for IconReference {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            index: -1,
            group_name: None,
        }
    }
}

impl IconReference {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

/// Icon path with the optional suffix after its last comma taken apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconSpec {
    pub path: String,
    pub index: i32,
    pub group_name: Option<String>,
}

/// Split `C:\app.exe,3` style references.
///
/// An integer suffix becomes the index; a negative one additionally names
/// the group by its absolute value. Any other suffix is a group name.
pub fn split_icon_index(display_icon: &str) -> IconSpec {
    let Some(pos) = display_icon.rfind(',') else {
        return IconSpec {
            path: display_icon.to_string(),
            index: -1,
            group_name: None,
        };
    };

    let path = display_icon[..pos].to_string();
    let suffix = &display_icon[pos + 1..];
    match suffix.trim().parse::<i32>() {
        Ok(index) => IconSpec {
            path,
            index,
            group_name: (index < 0).then(|| index.unsigned_abs().to_string()),
        },
        Err(_) => IconSpec {
            path,
            index: -1,
            group_name: Some(suffix.to_string()),
        },
    }
}
