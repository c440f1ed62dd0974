//! ProgInfo Core - Headless library for installed-program metadata.
//!
//! Reads the uninstall registrations of the Windows registry into typed
//! records, merges duplicates registered under several roots, resolves
//! program icons and keeps JSON backups that can be replayed into the
//! registry. Everything runs against a [`KeyValueStore`], so the whole
//! pipeline also works over an in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use proginfo_core::ProgramInfoApi;
//!
//! #[tokio::main]
//! async fn main() -> proginfo_core::Result<()> {
//!     let api = ProgramInfoApi::builder().load_icons(true).build()?;
//!
//!     let programs = api.list_programs().await;
//!     println!("Found {} programs", programs.len());
//!
//!     api.create_backup(&programs, "./backups".as_ref());
//!     Ok(())
//! }
//! ```

pub mod actions;
pub mod backup;
pub mod config;
pub mod error;
pub mod icon;
pub mod naming;
pub mod programs;
pub mod registry;
pub mod serializer;

mod api;

// Re-export commonly used types
pub use actions::ProgramActions;
pub use backup::{BackupManifestEntry, BackupService};
pub use error::{ProgInfoError, Result};
pub use icon::{IconFinder, IconLoader, IconReference};
pub use programs::{Locale, ProgramRecord, ProgramRepository, UninstallLocation};
#[cfg(windows)]
pub use registry::WindowsRegistryStore;
pub use registry::{KeyValueStore, MemoryStore, RegValue};
pub use serializer::{RegistrySerializer, SerializerOptions};

pub use api::ProgramInfoApiBuilder;

use std::sync::Arc;

/// Main entry point for programmatic access.
///
/// Owns the store and every service built on it. Cheap to clone.
#[derive(Clone)]
pub struct ProgramInfoApi {
    store: Arc<dyn KeyValueStore>,
    serializer: RegistrySerializer,
    repository: ProgramRepository,
    icon_loader: IconLoader,
    backup: BackupService,
    actions: ProgramActions,
    load_icons: bool,
    fetch_fallbacks: bool,
}

impl std::fmt::Debug for ProgramInfoApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgramInfoApi")
            .field("repository", &self.repository)
            .field("load_icons", &self.load_icons)
            .field("fetch_fallbacks", &self.fetch_fallbacks)
            .finish_non_exhaustive()
    }
}

impl ProgramInfoApi {
    /// Create a builder for ProgramInfoApi.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let api = ProgramInfoApi::builder()
    ///     .store(Arc::new(MemoryStore::new()))
    ///     .fetch_fallbacks(false)
    ///     .build()?;
    /// ```
    pub fn builder() -> ProgramInfoApiBuilder {
        ProgramInfoApiBuilder::new()
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn serializer(&self) -> &RegistrySerializer {
        &self.serializer
    }

    pub fn repository(&self) -> &ProgramRepository {
        &self.repository
    }

    pub fn backup_service(&self) -> &BackupService {
        &self.backup
    }

    pub fn actions(&self) -> &ProgramActions {
        &self.actions
    }
}
