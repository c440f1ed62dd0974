//! Installed-program records and the repository that reads them.

mod fallback;
mod fusion;
mod locale;
mod record;
mod repository;

pub use fallback::{directory_size, fetch_fallback_properties};
pub use fusion::fuse_all_duplicates;
pub use locale::Locale;
pub use record::{IconPayload, ProgramRecord};
pub use repository::{ProgramRepository, UninstallLocation};
