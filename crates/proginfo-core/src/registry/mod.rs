//! Registry access.
//!
//! Everything above this module talks to a [`KeyValueStore`]; the live
//! Windows registry is one implementation, [`MemoryStore`] another.

mod memory;
pub mod path;
mod store;
mod value;
#[cfg(windows)]
mod windows;

pub use memory::MemoryStore;
pub use path::{Hive, RegPath};
pub use store::KeyValueStore;
pub use value::{RegValue, RegValueKind};
#[cfg(windows)]
pub use windows::WindowsRegistryStore;
