use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::{Patch, Result, WaitlistError};
use crate::model::ambulance::{Ambulance, WaitingListEntry, is_valid_ambulance_id};

/// Id placeholder clients send when they want the server to assign one.
pub const NEW_ID_SENTINEL: &str = "@new";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntryRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub patient_id: Option<String>,
    #[serde(default)]
    pub waiting_since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
}

impl NewEntryRequest {
    /// Validates the request and builds the entry to insert.
    ///
    /// `estimatedDurationMinutes` is required and must be positive; there is no
    /// default. A missing `waitingSince` defaults to `received_at`. The id is
    /// assigned here, once per request, so every retry of the same create inserts
    /// the same entry.
    pub fn into_entry(self, received_at: DateTime<Utc>) -> Result<WaitingListEntry> {
        let patient_id = self
            .patient_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| WaitlistError::validation("Patient ID is required"))?
            .to_string();

        let estimated_duration_minutes = match self.estimated_duration_minutes {
            Some(minutes) if minutes > 0 => minutes,
            _ => {
                return Err(WaitlistError::validation(
                    "Estimated duration must be a positive number of minutes",
                ));
            }
        };

        let id = resolve_id(self.id.as_deref());

        Ok(WaitingListEntry::new(
            id,
            patient_id,
            self.waiting_since.unwrap_or(received_at),
            estimated_duration_minutes,
        ))
    }
}

/// Partial update of a waiting-list entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryPatchRequest {
    #[serde(default)]
    pub id: Patch<String>,
    #[serde(default)]
    pub patient_id: Patch<String>,
    #[serde(default)]
    pub waiting_since: Patch<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_duration_minutes: Patch<u32>,
}

impl EntryPatchRequest {
    pub fn validate(&self) -> Result<()> {
        if self.estimated_duration_minutes.value() == Some(&0) {
            return Err(WaitlistError::validation(
                "Estimated duration must be a positive number of minutes",
            ));
        }
        Ok(())
    }

    /// Merges present values into `entry`. Strings are trimmed the way creates trim them;
    /// blank strings and nulls leave fields as they are.
    pub fn apply_to(&self, entry: &mut WaitingListEntry) {
        if let Some(patient_id) = non_blank(&self.patient_id) {
            entry.patient_id = patient_id.to_string();
        }
        if let Some(id) = non_blank(&self.id) {
            entry.id = id.to_string();
        }
        if let Some(waiting_since) = self.waiting_since.value() {
            entry.waiting_since = *waiting_since;
        }
        if let Some(minutes) = self.estimated_duration_minutes.value() {
            if *minutes > 0 {
                entry.estimated_duration_minutes = *minutes;
            }
        }
    }

    pub fn has_changes(&self) -> bool {
        non_blank(&self.id).is_some()
            || non_blank(&self.patient_id).is_some()
            || self.waiting_since.value().is_some()
            || self.estimated_duration_minutes.value().is_some()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAmbulanceRequest {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub room_number: Option<String>,
}

impl NewAmbulanceRequest {
    pub fn into_ambulance(self) -> Result<Ambulance> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| WaitlistError::validation("Ambulance name is required"))?
            .to_string();

        let id = resolve_id(self.id.as_deref());
        if !is_valid_ambulance_id(&id) {
            return Err(WaitlistError::validation(
                "Ambulance ID may contain only letters, digits, '-', '_' and '.'",
            ));
        }

        let mut ambulance = Ambulance::new(id, name);
        ambulance.room_number = self
            .room_number
            .map(|room| room.trim().to_string())
            .filter(|room| !room.is_empty());
        Ok(ambulance)
    }
}

fn resolve_id(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(id) if !id.is_empty() && id != NEW_ID_SENTINEL => id.to_string(),
        _ => Uuid::new_v4().to_string(),
    }
}

fn non_blank(patch: &Patch<String>) -> Option<&str> {
    patch
        .value()
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
