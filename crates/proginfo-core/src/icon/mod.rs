//! Icon resolution and extraction.

mod codec;
mod finder;
mod ico;
mod loader;
mod reference;

pub use codec::{IconCodec, IconContainer, IconGroup, IconGroupEntry, IconImage};
pub use finder::IconFinder;
pub use ico::IcoCodec;
pub use loader::{select_image, IconLoader};
pub use reference::{split_icon_index, IconReference, IconSpec};
