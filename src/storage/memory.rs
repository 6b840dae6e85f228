use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    AmbulanceRegistry, AmbulanceStore, ProvisionOutcome, SaveOutcome, StoreResult, Version,
    Versioned,
};
use crate::model::Ambulance;

/// Process-local store. Each ambulance is kept as one versioned document.
#[derive(Default)]
pub struct InMemoryAmbulanceStore {
    documents: RwLock<HashMap<String, Versioned<Ambulance>>>,
}

impl InMemoryAmbulanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with `ambulances`, each at the initial version.
    pub fn with_ambulances(ambulances: impl IntoIterator<Item = Ambulance>) -> Self {
        let documents = ambulances
            .into_iter()
            .map(|ambulance| {
                (
                    ambulance.id.clone(),
                    Versioned {
                        version: Version::INITIAL,
                        value: ambulance,
                    },
                )
            })
            .collect();

        Self {
            documents: RwLock::new(documents),
        }
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl AmbulanceStore for InMemoryAmbulanceStore {
    async fn load(&self, ambulance_id: &str) -> StoreResult<Option<Versioned<Ambulance>>> {
        Ok(self.documents.read().await.get(ambulance_id).cloned())
    }

    async fn conditional_save(
        &self,
        ambulance: &Ambulance,
        expected_version: Version,
    ) -> StoreResult<SaveOutcome> {
        let mut documents = self.documents.write().await;
        let Some(stored) = documents.get_mut(&ambulance.id) else {
            return Ok(SaveOutcome::VersionConflict { current: None });
        };

        if stored.version != expected_version {
            return Ok(SaveOutcome::VersionConflict {
                current: Some(stored.version),
            });
        }

        stored.version = stored.version.next();
        stored.value = ambulance.clone();
        Ok(SaveOutcome::Saved {
            version: stored.version,
        })
    }
}

#[async_trait]
impl AmbulanceRegistry for InMemoryAmbulanceStore {
    async fn create(&self, ambulance: Ambulance) -> StoreResult<ProvisionOutcome> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&ambulance.id) {
            return Ok(ProvisionOutcome::AlreadyExists);
        }

        documents.insert(
            ambulance.id.clone(),
            Versioned {
                version: Version::INITIAL,
                value: ambulance,
            },
        );
        Ok(ProvisionOutcome::Created {
            version: Version::INITIAL,
        })
    }

    async fn remove(&self, ambulance_id: &str) -> StoreResult<bool> {
        Ok(self.documents.write().await.remove(ambulance_id).is_some())
    }
}
