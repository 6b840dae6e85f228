// ============================================================================
// Ambulance Waiting List Library
// ============================================================================

pub mod config;
pub mod core;
pub mod model;
pub mod service;
pub mod storage;
pub mod telemetry;
pub mod waitlist;
pub mod web;

// Re-export main types for convenience
pub use config::{AppConfig, CliOverrides, Environment};
pub use core::{Cancellation, Patch, Result, WaitlistError};
pub use model::{
    Ambulance, EntryPatchRequest, NewAmbulanceRequest, NewEntryRequest, WaitingListEntry,
};

// Re-export the waiting-list core
pub use waitlist::{
    ConflictRetryPolicy, Mutation, MutationOutcome, UpdateOrchestrator, reconcile,
    reconcile_waiting_list,
};

// Re-export storage ports and adapters
pub use storage::{
    AmbulanceRegistry, AmbulanceRepository, AmbulanceStore, FileAmbulanceStore,
    InMemoryAmbulanceStore, ProvisionOutcome, SaveOutcome, StoreError, Version, Versioned,
};

// ============================================================================
// Application wiring
// ============================================================================

pub use service::{AmbulanceService, WaitingListService};
pub use telemetry::{MetricsRecorder, WaitingListMetrics};
pub use web::{AppState, ResultBody, build_router};

use std::sync::Arc;

/// Builds the HTTP state over one repository, sharing it between the
/// waiting-list core and ambulance provisioning.
pub fn app_state<R>(
    repository: Arc<R>,
    retry: ConflictRetryPolicy,
    metrics: Arc<dyn WaitingListMetrics>,
) -> AppState
where
    R: AmbulanceRepository + 'static,
{
    let orchestrator = UpdateOrchestrator::new(repository.clone(), retry);
    AppState::new(
        WaitingListService::new(orchestrator, metrics),
        AmbulanceService::new(repository),
    )
}
