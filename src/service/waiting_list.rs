use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use crate::core::{Cancellation, Result};
use crate::model::{EntryPatchRequest, NewEntryRequest, WaitingListEntry};
use crate::telemetry::WaitingListMetrics;
use crate::waitlist::{
    CreateEntry, DeleteEntry, GetEntry, ListEntries, UpdateEntry, UpdateOrchestrator,
};

/// Waiting-list use cases for one ambulance at a time.
///
/// Writes are counted only after the orchestrator reports them persisted.
#[derive(Clone)]
pub struct WaitingListService {
    orchestrator: UpdateOrchestrator,
    metrics: Arc<dyn WaitingListMetrics>,
}

impl WaitingListService {
    pub fn new(orchestrator: UpdateOrchestrator, metrics: Arc<dyn WaitingListMetrics>) -> Self {
        Self {
            orchestrator,
            metrics,
        }
    }

    pub async fn create_entry(
        &self,
        ambulance_id: &str,
        request: NewEntryRequest,
        cancel: &Cancellation,
    ) -> Result<WaitingListEntry> {
        let requested_id = request.id.clone();
        let entry = request.into_entry(Utc::now()).inspect_err(|err| {
            warn!(ambulance_id = %ambulance_id, error = %err, "rejected new entry");
        })?;
        if requested_id.as_deref() != Some(entry.id.as_str()) {
            debug!(ambulance_id = %ambulance_id, entry_id = %entry.id, "generated entry id");
        }

        let created = self
            .orchestrator
            .run_update_applied(ambulance_id, &CreateEntry::new(entry), cancel)
            .await?;
        self.metrics.entry_created(ambulance_id, &created.ambulance_name);
        Ok(created.output)
    }

    pub async fn delete_entry(
        &self,
        ambulance_id: &str,
        entry_id: &str,
        cancel: &Cancellation,
    ) -> Result<()> {
        let deleted = self
            .orchestrator
            .run_update_applied(ambulance_id, &DeleteEntry::new(entry_id), cancel)
            .await?;
        self.metrics.entry_deleted(ambulance_id, &deleted.ambulance_name);
        Ok(())
    }

    pub async fn list_entries(
        &self,
        ambulance_id: &str,
        cancel: &Cancellation,
    ) -> Result<Vec<WaitingListEntry>> {
        self.orchestrator
            .run_update(ambulance_id, &ListEntries, cancel)
            .await
    }

    pub async fn get_entry(
        &self,
        ambulance_id: &str,
        entry_id: &str,
        cancel: &Cancellation,
    ) -> Result<WaitingListEntry> {
        self.orchestrator
            .run_update(ambulance_id, &GetEntry::new(entry_id), cancel)
            .await
    }

    /// Merges `patch` into the entry. A patch with nothing to apply returns the
    /// entry as stored and is neither saved nor counted.
    pub async fn update_entry(
        &self,
        ambulance_id: &str,
        entry_id: &str,
        patch: EntryPatchRequest,
        cancel: &Cancellation,
    ) -> Result<WaitingListEntry> {
        let updated = self
            .orchestrator
            .run_update_applied(ambulance_id, &UpdateEntry::new(entry_id, patch), cancel)
            .await?;
        if updated.persisted {
            self.metrics.entry_updated(ambulance_id, &updated.ambulance_name);
        }
        Ok(updated.output)
    }
}
