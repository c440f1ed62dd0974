//! Program action methods on ProgramInfoApi.
//!
//! Records from another source are refused before anything is launched.

use crate::programs::ProgramRecord;
use crate::ProgramInfoApi;
use tracing::warn;

impl ProgramInfoApi {
    pub async fn uninstall(&self, record: &ProgramRecord, quiet: bool) -> bool {
        self.check_responsible(record) && self.actions.uninstall(record, quiet).await
    }

    pub async fn modify(&self, record: &ProgramRecord, extra_args: Option<&str>) -> bool {
        self.check_responsible(record) && self.actions.modify(record, extra_args).await
    }

    pub async fn open_location(&self, record: &ProgramRecord) -> bool {
        self.check_responsible(record) && self.actions.open_location(record).await
    }

    pub async fn open_registry_location(&self, record: &ProgramRecord) -> bool {
        self.check_responsible(record) && self.actions.open_registry_location(record).await
    }

    fn check_responsible(&self, record: &ProgramRecord) -> bool {
        let responsible = self.is_responsible(record);
        if !responsible {
            warn!("{} belongs to source {:?}", record, record.source_key);
        }
        responsible
    }
}
