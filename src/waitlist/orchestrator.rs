use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info_span, warn};

use super::mutation::{Mutation, MutationOutcome};
use crate::core::{Cancellation, Result, WaitlistError};
use crate::storage::{AmbulanceStore, SaveOutcome};

pub const AMBULANCE_NOT_FOUND_MESSAGE: &str = "Ambulance not found";
pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "Ambulance was modified concurrently; retry limit reached";

/// Configuration for automatic retry after a version conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRetryPolicy {
    /// Maximum number of load/mutate/save attempts, the first one included.
    pub max_attempts: u32,
    /// Base duration in milliseconds for backoff calculation.
    pub initial_backoff_ms: u64,
    /// Upper bound for a single backoff in milliseconds.
    pub max_backoff_ms: u64,
}

impl Default for ConflictRetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 5,
            max_backoff_ms: 100,
        }
    }
}

impl ConflictRetryPolicy {
    /// Exponential backoff before attempt `attempt + 1`.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let base = self.initial_backoff_ms.max(1);
        let max = self.max_backoff_ms.max(base);
        let factor = 2u64.saturating_pow(attempt.saturating_sub(1));
        base.saturating_mul(factor).min(max)
    }
}

/// What a run produced, with the aggregate facts callers label metrics with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied<T> {
    pub output: T,
    pub ambulance_name: String,
    /// A new version was written.
    pub persisted: bool,
}

/// Runs mutations against stored ambulances under optimistic concurrency.
///
/// Each attempt loads the aggregate, applies the mutation to that copy and
/// saves it conditionally on the loaded version. A version conflict throws the
/// copy away and starts over from a fresh load, so a concurrent writer's change
/// is never overwritten. Store failures are returned without retry.
#[derive(Clone)]
pub struct UpdateOrchestrator {
    store: Arc<dyn AmbulanceStore>,
    retry: ConflictRetryPolicy,
}

impl UpdateOrchestrator {
    pub fn new(store: Arc<dyn AmbulanceStore>, retry: ConflictRetryPolicy) -> Self {
        Self { store, retry }
    }

    pub async fn run_update<M>(
        &self,
        ambulance_id: &str,
        mutation: &M,
        cancel: &Cancellation,
    ) -> Result<M::Output>
    where
        M: Mutation,
    {
        self.run_update_applied(ambulance_id, mutation, cancel)
            .await
            .map(|applied| applied.output)
    }

    /// Like [`Self::run_update`], but also reports whether the run wrote a new version.
    pub async fn run_update_applied<M>(
        &self,
        ambulance_id: &str,
        mutation: &M,
        cancel: &Cancellation,
    ) -> Result<Applied<M::Output>>
    where
        M: Mutation,
    {
        let span = info_span!(
            "run_update",
            ambulance_id = %ambulance_id,
            mutation = mutation.name()
        );

        async move {
            let max_attempts = self.retry.max_attempts.max(1);
            let mut attempt = 1u32;

            loop {
                if cancel.is_cancelled() {
                    return Err(WaitlistError::Cancelled);
                }

                let loaded = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(WaitlistError::Cancelled),
                    loaded = self.store.load(ambulance_id) => loaded?,
                };
                let Some(loaded) = loaded else {
                    return Err(WaitlistError::not_found(AMBULANCE_NOT_FOUND_MESSAGE));
                };

                let expected_version = loaded.version;
                let mut ambulance = loaded.value;
                let output = match mutation.apply(&mut ambulance)? {
                    MutationOutcome::Unchanged(output) => {
                        return Ok(Applied {
                            output,
                            ambulance_name: ambulance.name,
                            persisted: false,
                        });
                    }
                    MutationOutcome::Changed(output) => output,
                };

                // The save itself is never raced against cancellation: once issued it
                // runs to completion so its outcome is always known.
                if cancel.is_cancelled() {
                    return Err(WaitlistError::Cancelled);
                }

                match self
                    .store
                    .conditional_save(&ambulance, expected_version)
                    .await?
                {
                    SaveOutcome::Saved { version } => {
                        debug!(attempt, %version, "ambulance saved");
                        return Ok(Applied {
                            output,
                            ambulance_name: ambulance.name,
                            persisted: true,
                        });
                    }
                    SaveOutcome::VersionConflict { current } => {
                        if attempt >= max_attempts {
                            warn!(
                                attempt,
                                max_attempts,
                                expected = %expected_version,
                                "giving up after repeated version conflicts"
                            );
                            return Err(WaitlistError::conflict(RETRIES_EXHAUSTED_MESSAGE));
                        }

                        let backoff_ms = self.retry.backoff_ms(attempt);
                        warn!(
                            attempt,
                            max_attempts,
                            expected = %expected_version,
                            current = ?current,
                            backoff_ms,
                            "version conflict, retrying from fresh state"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => return Err(WaitlistError::Cancelled),
                            _ = tokio::time::sleep(Duration::from_millis(backoff_ms)) => {}
                        }
                        attempt += 1;
                    }
                }
            }
        }
        .instrument(span)
        .await
    }
}
