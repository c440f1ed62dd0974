//! Enumeration of the uninstall roots.

use super::fusion::fuse_all_duplicates;
use super::locale::Locale;
use super::record::ProgramRecord;
use crate::config::RegistryConfig;
use crate::icon::IconFinder;
use crate::registry::path;
use crate::serializer::RegistrySerializer;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// One of the registry keys that hold uninstall registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UninstallLocation {
    LocalMachine64,
    LocalMachine32,
    CurrentUser64,
    CurrentUser32,
}

impl UninstallLocation {
    /// All roots in scan priority order.
    pub const ALL: [UninstallLocation; 4] = [
        UninstallLocation::LocalMachine64,
        UninstallLocation::LocalMachine32,
        UninstallLocation::CurrentUser64,
        UninstallLocation::CurrentUser32,
    ];

    pub fn key_path(&self) -> &'static str {
        match self {
            UninstallLocation::LocalMachine64 => RegistryConfig::LOCAL_MACHINE_UNINSTALL_64,
            UninstallLocation::LocalMachine32 => RegistryConfig::LOCAL_MACHINE_UNINSTALL_32,
            UninstallLocation::CurrentUser64 => RegistryConfig::CURRENT_USER_UNINSTALL_64,
            UninstallLocation::CurrentUser32 => RegistryConfig::CURRENT_USER_UNINSTALL_32,
        }
    }
}

impl fmt::Display for UninstallLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_path())
    }
}

/// Reads every uninstall root and fuses the results.
#[derive(Debug, Clone)]
pub struct ProgramRepository {
    serializer: RegistrySerializer,
    icon_finder: Arc<IconFinder>,
    roots: Vec<String>,
}

impl ProgramRepository {
    /// Repository over the four standard uninstall roots.
    pub fn new(serializer: RegistrySerializer, icon_finder: Arc<IconFinder>) -> Self {
        Self {
            serializer,
            icon_finder,
            roots: UninstallLocation::ALL
                .iter()
                .map(|location| location.key_path().to_string())
                .collect(),
        }
    }

    /// Replace the scanned roots. Order sets fusion priority.
    pub fn with_roots<I, S>(mut self, roots: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roots = roots.into_iter().map(Into::into).collect();
        self
    }

    pub fn roots(&self) -> &[String] {
        &self.roots
    }

    pub fn serializer(&self) -> &RegistrySerializer {
        &self.serializer
    }

    /// Scan all roots and return one fused record per display name.
    pub async fn get_all(&self) -> Vec<ProgramRecord> {
        self.get_all_with_progress(None).await
    }

    /// Like [`get_all`](Self::get_all), additionally sending each record to
    /// `progress_tx` as soon as it has been read. Sent records are not yet
    /// fused.
    ///
    /// Roots are scanned concurrently; results are concatenated in root
    /// order before fusion so the outcome does not depend on timing.
    pub async fn get_all_with_progress(
        &self,
        progress_tx: Option<mpsc::UnboundedSender<ProgramRecord>>,
    ) -> Vec<ProgramRecord> {
        let tasks = self.roots.iter().map(|root| {
            let repository = self.clone();
            let root = root.clone();
            let progress_tx = progress_tx.clone();
            tokio::task::spawn_blocking(move || repository.scan_root(&root, progress_tx.as_ref()))
        });

        let mut records = Vec::new();
        for (root, joined) in self.roots.iter().zip(futures::future::join_all(tasks).await) {
            match joined {
                Ok(found) => records.extend(found),
                Err(e) => warn!("Scan of {} failed: {}", root, e),
            }
        }

        let scanned = records.len();
        let fused = fuse_all_duplicates(records);
        info!(
            "Found {} programs ({} uninstall entries in {} roots)",
            fused.len(),
            scanned,
            self.roots.len()
        );
        fused
    }

    /// Read every subkey of `root` into a completed record.
    ///
    /// Subkeys without a display name are skipped. A missing root yields an
    /// empty list.
    pub fn scan_root(
        &self,
        root: &str,
        progress_tx: Option<&mpsc::UnboundedSender<ProgramRecord>>,
    ) -> Vec<ProgramRecord> {
        let names = match self.serializer.store().subkey_names(root) {
            Ok(Some(names)) => names,
            Ok(None) => {
                debug!("Uninstall root {} does not exist", root);
                return Vec::new();
            }
            Err(e) => {
                warn!("Failed to list {}: {}", root, e);
                return Vec::new();
            }
        };

        let mut records = Vec::with_capacity(names.len());
        for name in names.iter().filter(|name| !name.is_empty()) {
            let key_path = path::join(root, name);
            let Some(mut record) = self.serializer.deserialize::<ProgramRecord>(&key_path) else {
                continue;
            };
            record.id = name.clone();
            record.reg_key = key_path;

            if record.name().is_none() {
                debug!("Skipping {}: no display name", record.reg_key);
                continue;
            }

            self.complete_record(&mut record);

            if let Some(tx) = progress_tx {
                if tx.send(record.clone()).is_err() {
                    debug!("Progress receiver dropped, not reporting {}", record);
                }
            }
            records.push(record);
        }
        debug!("Read {} programs from {}", records.len(), root);
        records
    }

    /// Fill the fields the mapper leaves alone: locale and icon reference.
    pub fn complete_record(&self, record: &mut ProgramRecord) {
        if record.locale.is_none() {
            record.locale = resolve_locale(record);
        }
        if record.display_icon_info.is_none() {
            record.display_icon_info = self.icon_finder.resolve_icon(record);
        }
    }
}

fn resolve_locale(record: &ProgramRecord) -> Option<Locale> {
    let language = record.language.as_deref().filter(|s| !s.is_empty())?;
    let Some(lcid) = Locale::parse_lcid(language) else {
        warn!("Invalid language {:?} for {}", language, record.reg_key);
        return None;
    };
    let locale = Locale::from_lcid(lcid);
    if locale.is_none() {
        debug!("Unknown LCID {} for {}", lcid, record.reg_key);
    }
    locale
}
