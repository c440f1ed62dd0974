//! Program listing methods on ProgramInfoApi.

use crate::programs::{self, ProgramRecord};
use crate::ProgramInfoApi;
use tokio::sync::mpsc;
use tracing::{debug, warn};

impl ProgramInfoApi {
    // ========================================
    // Scanning
    // ========================================

    /// Run a full scan cycle: enumerate, fuse, then apply the configured
    /// fallback and icon loading steps.
    pub async fn list_programs(&self) -> Vec<ProgramRecord> {
        self.list_programs_with_progress(None).await
    }

    /// Like [`list_programs`](Self::list_programs), sending each raw record
    /// to `progress_tx` as it is read.
    pub async fn list_programs_with_progress(
        &self,
        progress_tx: Option<mpsc::UnboundedSender<ProgramRecord>>,
    ) -> Vec<ProgramRecord> {
        let records = self.repository.get_all_with_progress(progress_tx).await;
        if !self.fetch_fallbacks && !self.load_icons {
            return records;
        }

        let api = self.clone();
        enrich_in_background(records, move |record| api.enrich(record)).await
    }

    /// Re-read `record` from its registry key and take over the current
    /// values. `false` when the key no longer holds a program.
    pub fn refresh_program(&self, record: &mut ProgramRecord) -> bool {
        if record.reg_key.is_empty() {
            return false;
        }
        let Some(mut fresh) = self.serializer.deserialize::<ProgramRecord>(&record.reg_key) else {
            debug!("{} is gone", record.reg_key);
            return false;
        };
        fresh.id.clone_from(&record.id);
        fresh.reg_key.clone_from(&record.reg_key);
        self.repository.complete_record(&mut fresh);
        record.update_from(&fresh);
        true
    }

    // ========================================
    // Enrichment
    // ========================================

    /// Fill properties the registry entry lacks from the filesystem.
    pub fn fetch_fallback_properties(&self, record: &mut ProgramRecord) {
        programs::fetch_fallback_properties(record);
    }

    /// Attach the image of the record's icon reference. `true` if loaded.
    pub fn load_icon(&self, record: &mut ProgramRecord) -> bool {
        let Some(reference) = record.display_icon_info.as_ref() else {
            return false;
        };
        match self.icon_loader.load(reference) {
            Some(bytes) => {
                record.display_icon_payload.0 = Some(bytes);
                true
            }
            None => false,
        }
    }

    /// Whether `record` was produced by this API's source.
    pub fn is_responsible(&self, record: &ProgramRecord) -> bool {
        record.source_key == self.backup.source_key()
    }

    fn enrich(&self, record: &mut ProgramRecord) {
        if self.fetch_fallbacks {
            self.fetch_fallback_properties(record);
        }
        if self.load_icons {
            self.load_icon(record);
        }
    }
}

/// Apply `enrich` to every record on the blocking pool. The scanned records
/// are returned untouched if the enrichment task dies.
async fn enrich_in_background<F>(records: Vec<ProgramRecord>, enrich: F) -> Vec<ProgramRecord>
where
    F: Fn(&mut ProgramRecord) + Send + 'static,
{
    let scanned = records.clone();
    let enriched = tokio::task::spawn_blocking(move || {
        records
            .into_iter()
            .map(|mut record| {
                enrich(&mut record);
                record
            })
            .collect::<Vec<_>>()
    })
    .await;

    match enriched {
        Ok(records) => records,
        Err(e) => {
            warn!("Enriching programs failed, keeping scanned records: {}", e);
            scanned
        }
    }
}
