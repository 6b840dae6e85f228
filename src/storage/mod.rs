//! Aggregate store gateway.
//!
//! [`AmbulanceStore`] is the only path the waiting-list core uses to reach
//! persisted state: a plain load plus a version-checked conditional save.
//! Stores never retry; a failed precondition is reported back to the caller
//! as [`SaveOutcome::VersionConflict`] and the retry policy lives in the
//! update orchestrator.
//!
//! [`AmbulanceRegistry`] covers provisioning of whole aggregates and is kept
//! apart so the core cannot create or drop ambulances by accident.

pub mod memory;
pub mod persistence;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::Ambulance;

pub use memory::InMemoryAmbulanceStore;
pub use persistence::FileAmbulanceStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Opaque version token of a stored aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(u64);

impl Version {
    pub const INITIAL: Version = Version(1);

    pub fn next(self) -> Version {
        Version(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for Version {
    fn from(value: u64) -> Self {
        Version(value)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// A loaded aggregate together with the version it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub version: Version,
    pub value: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Write accepted; the aggregate is now at `version`.
    Saved { version: Version },
    /// Stored version differs from the expected one. `current` is `None` when
    /// the aggregate has been removed since it was loaded.
    VersionConflict { current: Option<Version> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    Created { version: Version },
    AlreadyExists,
}

#[async_trait]
pub trait AmbulanceStore: Send + Sync {
    async fn load(&self, ambulance_id: &str) -> StoreResult<Option<Versioned<Ambulance>>>;

    async fn conditional_save(
        &self,
        ambulance: &Ambulance,
        expected_version: Version,
    ) -> StoreResult<SaveOutcome>;
}

#[async_trait]
pub trait AmbulanceRegistry: Send + Sync {
    async fn create(&self, ambulance: Ambulance) -> StoreResult<ProvisionOutcome>;

    /// Returns `false` when there was nothing to remove.
    async fn remove(&self, ambulance_id: &str) -> StoreResult<bool>;
}

/// Stores that serve both the waiting-list core and provisioning.
pub trait AmbulanceRepository: AmbulanceStore + AmbulanceRegistry {}

impl<T> AmbulanceRepository for T where T: AmbulanceStore + AmbulanceRegistry {}
