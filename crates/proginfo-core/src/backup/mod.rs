//! Backup and restore of program records.

mod atomic;
mod manifest;
mod service;

pub use atomic::{atomic_read_json, atomic_write_json};
pub use manifest::{latest_entry, BackupManifestEntry};
pub use service::BackupService;
