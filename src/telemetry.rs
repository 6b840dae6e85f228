//! Tracing setup and waiting-list counters.

use std::sync::atomic::{AtomicU64, Ordering};

use metrics::{counter, describe_counter};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// Entries created, labelled by `ambulance_id` and `ambulance_name`.
pub const ENTRIES_CREATED: &str = "ambulance_waiting_list_entries_created_total";
/// Entries updated, labelled by `ambulance_id` and `ambulance_name`.
pub const ENTRIES_UPDATED: &str = "ambulance_waiting_list_entries_updated_total";
/// Entries deleted, labelled by `ambulance_id` and `ambulance_name`.
pub const ENTRIES_DELETED: &str = "ambulance_waiting_list_entries_deleted_total";

/// Sink for successful waiting-list writes.
pub trait WaitingListMetrics: Send + Sync {
    fn entry_created(&self, ambulance_id: &str, ambulance_name: &str);
    fn entry_updated(&self, ambulance_id: &str, ambulance_name: &str);
    fn entry_deleted(&self, ambulance_id: &str, ambulance_name: &str);
}

/// Forwards to whatever `metrics` recorder the binary installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsRecorder;

impl MetricsRecorder {
    pub fn register() -> Self {
        describe_counter!(ENTRIES_CREATED, "Total waiting-list entries created");
        describe_counter!(ENTRIES_UPDATED, "Total waiting-list entries updated");
        describe_counter!(ENTRIES_DELETED, "Total waiting-list entries deleted");
        Self
    }
}

impl WaitingListMetrics for MetricsRecorder {
    fn entry_created(&self, ambulance_id: &str, ambulance_name: &str) {
        counter!(ENTRIES_CREATED, &labels(ambulance_id, ambulance_name)).increment(1);
    }

    fn entry_updated(&self, ambulance_id: &str, ambulance_name: &str) {
        counter!(ENTRIES_UPDATED, &labels(ambulance_id, ambulance_name)).increment(1);
    }

    fn entry_deleted(&self, ambulance_id: &str, ambulance_name: &str) {
        counter!(ENTRIES_DELETED, &labels(ambulance_id, ambulance_name)).increment(1);
    }
}

fn labels(ambulance_id: &str, ambulance_name: &str) -> [(&'static str, String); 2] {
    [
        ("ambulance_id", ambulance_id.to_string()),
        ("ambulance_name", ambulance_name.to_string()),
    ]
}

/// In-process totals, used by tests to observe which writes were counted.
#[derive(Debug, Default)]
pub struct CountingMetrics {
    created: AtomicU64,
    updated: AtomicU64,
    deleted: AtomicU64,
}

impl CountingMetrics {
    pub fn created(&self) -> u64 {
        self.created.load(Ordering::Relaxed)
    }

    pub fn updated(&self) -> u64 {
        self.updated.load(Ordering::Relaxed)
    }

    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Relaxed)
    }
}

impl WaitingListMetrics for CountingMetrics {
    fn entry_created(&self, _ambulance_id: &str, _ambulance_name: &str) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    fn entry_updated(&self, _ambulance_id: &str, _ambulance_name: &str) {
        self.updated.fetch_add(1, Ordering::Relaxed);
    }

    fn entry_deleted(&self, _ambulance_id: &str, _ambulance_name: &str) {
        self.deleted.fetch_add(1, Ordering::Relaxed);
    }
}

/// Installs the global subscriber: JSON lines in production, compact text otherwise.
///
/// `RUST_LOG` directives, when set, take precedence over `LOG_LEVEL`.
pub fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(config.log_level).into())
        .from_env_lossy();

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.environment.is_production() {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(false).compact())
            .try_init()
    };
    installed.map_err(|err| anyhow::anyhow!("failed to install tracing subscriber: {err}"))?;

    if let Some(raw) = &config.rejected_log_level {
        tracing::warn!(log_level = %raw, "unrecognised LOG_LEVEL, using info");
    }
    Ok(())
}
