use std::sync::Arc;

use tracing::info;

use crate::core::{Result, WaitlistError};
use crate::model::{Ambulance, NewAmbulanceRequest};
use crate::storage::{AmbulanceRepository, ProvisionOutcome};
use crate::waitlist::orchestrator::AMBULANCE_NOT_FOUND_MESSAGE;

pub const AMBULANCE_EXISTS_MESSAGE: &str = "Ambulance already exists";

/// Creates, reads and removes whole ambulance documents.
#[derive(Clone)]
pub struct AmbulanceService {
    repository: Arc<dyn AmbulanceRepository>,
}

impl AmbulanceService {
    pub fn new(repository: Arc<dyn AmbulanceRepository>) -> Self {
        Self { repository }
    }

    pub async fn create(&self, request: NewAmbulanceRequest) -> Result<Ambulance> {
        let ambulance = request.into_ambulance()?;
        match self.repository.create(ambulance.clone()).await? {
            ProvisionOutcome::Created { version } => {
                info!(ambulance_id = %ambulance.id, %version, "ambulance created");
                Ok(ambulance)
            }
            ProvisionOutcome::AlreadyExists => Err(WaitlistError::conflict(AMBULANCE_EXISTS_MESSAGE)),
        }
    }

    pub async fn get(&self, ambulance_id: &str) -> Result<Ambulance> {
        self.repository
            .load(ambulance_id)
            .await?
            .map(|stored| stored.value)
            .ok_or_else(|| WaitlistError::not_found(AMBULANCE_NOT_FOUND_MESSAGE))
    }

    pub async fn delete(&self, ambulance_id: &str) -> Result<()> {
        if !self.repository.remove(ambulance_id).await? {
            return Err(WaitlistError::not_found(AMBULANCE_NOT_FOUND_MESSAGE));
        }
        info!(ambulance_id = %ambulance_id, "ambulance deleted");
        Ok(())
    }
}
