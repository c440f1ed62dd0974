//! Builder for configuring ProgramInfoApi initialization.

use std::path::PathBuf;
use std::sync::Arc;

use crate::actions::ProgramActions;
use crate::backup::BackupService;
use crate::error::Result;
use crate::icon::{IconCodec, IconFinder, IconLoader};
use crate::programs::ProgramRepository;
use crate::registry::KeyValueStore;
use crate::serializer::{RegistrySerializer, SerializerOptions};
use crate::ProgramInfoApi;

/// Builder for configuring ProgramInfoApi initialization.
///
/// # Example
///
/// ```rust,ignore
/// use proginfo_core::ProgramInfoApi;
///
/// let api = ProgramInfoApi::builder()
///     .load_icons(true)
///     .installer_roots(vec!["C:\\Windows\\Installer".into()])
///     .build()?;
/// ```
pub struct ProgramInfoApiBuilder {
    store: Option<Arc<dyn KeyValueStore>>,
    installer_roots: Option<Vec<PathBuf>>,
    uninstall_roots: Option<Vec<String>>,
    icon_codec: Option<Arc<dyn IconCodec>>,
    serializer_options: SerializerOptions,
    source_key: Option<String>,
    load_icons: bool,
    fetch_fallbacks: bool,
}

impl Default for ProgramInfoApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramInfoApiBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            installer_roots: None,
            uninstall_roots: None,
            icon_codec: None,
            serializer_options: SerializerOptions::default(),
            source_key: None,
            load_icons: false,
            fetch_fallbacks: true,
        }
    }

    /// Store to read from and restore into.
    ///
    /// Default: the live Windows registry. Required on other platforms.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Directories searched for Windows Installer icon caches.
    ///
    /// Default: `%SystemRoot%\Installer` and `%APPDATA%\Microsoft\Installer`.
    pub fn installer_roots(mut self, roots: Vec<PathBuf>) -> Self {
        self.installer_roots = Some(roots);
        self
    }

    /// Registry keys scanned for uninstall entries, in fusion priority.
    ///
    /// Default: the four standard uninstall roots.
    pub fn uninstall_roots(mut self, roots: Vec<String>) -> Self {
        self.uninstall_roots = Some(roots);
        self
    }

    /// Codec used to extract icon images. Default: `.ico` files only.
    pub fn icon_codec(mut self, codec: Arc<dyn IconCodec>) -> Self {
        self.icon_codec = Some(codec);
        self
    }

    pub fn serializer_options(mut self, options: SerializerOptions) -> Self {
        self.serializer_options = options;
        self
    }

    /// Source key tag backups are partitioned by.
    ///
    /// Default: `"Windows Registry"`
    pub fn source_key(mut self, source_key: impl Into<String>) -> Self {
        self.source_key = Some(source_key.into());
        self
    }

    /// Attach icon image bytes to every listed record.
    ///
    /// Default: `false`
    pub fn load_icons(mut self, enable: bool) -> Self {
        self.load_icons = enable;
        self
    }

    /// Compute missing properties (install size) from the filesystem.
    ///
    /// Default: `true`
    pub fn fetch_fallbacks(mut self, enable: bool) -> Self {
        self.fetch_fallbacks = enable;
        self
    }

    /// Build the ProgramInfoApi instance.
    pub fn build(self) -> Result<ProgramInfoApi> {
        let store = match self.store {
            Some(store) => store,
            None => Self::default_store()?,
        };

        let serializer = RegistrySerializer::with_options(store.clone(), self.serializer_options);

        let icon_finder = Arc::new(match self.installer_roots {
            Some(roots) => IconFinder::new(roots),
            None => IconFinder::default(),
        });

        let mut repository = ProgramRepository::new(serializer.clone(), icon_finder);
        if let Some(roots) = self.uninstall_roots {
            repository = repository.with_roots(roots);
        }

        let icon_loader = match self.icon_codec {
            Some(codec) => IconLoader::new(codec),
            None => IconLoader::default(),
        };

        let mut backup = BackupService::new(serializer.clone());
        if let Some(source_key) = self.source_key {
            backup = backup.with_source_key(source_key);
        }

        Ok(ProgramInfoApi {
            actions: ProgramActions::new(store.clone()),
            store,
            serializer,
            repository,
            icon_loader,
            backup,
            load_icons: self.load_icons,
            fetch_fallbacks: self.fetch_fallbacks,
        })
    }

    #[cfg(windows)]
    fn default_store() -> Result<Arc<dyn KeyValueStore>> {
        Ok(Arc::new(crate::registry::WindowsRegistryStore::new()))
    }

    #[cfg(not(windows))]
    fn default_store() -> Result<Arc<dyn KeyValueStore>> {
        Err(crate::error::ProgInfoError::Config {
            message: "No registry store available on this platform; pass one to the builder"
                .to_string(),
        })
    }
}
