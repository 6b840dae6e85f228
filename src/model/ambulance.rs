use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length accepted for an ambulance identity.
pub const AMBULANCE_ID_MAX_LEN: usize = 128;

/// The aggregate root: one ambulance together with its waiting list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ambulance {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default)]
    pub waiting_list: Vec<WaitingListEntry>,
}

impl Ambulance {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            room_number: None,
            waiting_list: Vec::new(),
        }
    }

    pub fn entry_index(&self, entry_id: &str) -> Option<usize> {
        self.waiting_list
            .iter()
            .position(|entry| entry.id == entry_id)
    }

    pub fn entry(&self, entry_id: &str) -> Option<&WaitingListEntry> {
        self.waiting_list.iter().find(|entry| entry.id == entry_id)
    }
}

/// A patient waiting in one ambulance.
///
/// `position` and `estimated_start` are derived by reconciliation and are
/// overwritten on every mutation; values sent by clients are never trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitingListEntry {
    pub id: String,
    pub patient_id: String,
    pub waiting_since: DateTime<Utc>,
    pub estimated_duration_minutes: u32,
    #[serde(default)]
    pub position: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_start: Option<DateTime<Utc>>,
}

impl WaitingListEntry {
    pub fn new(
        id: impl Into<String>,
        patient_id: impl Into<String>,
        waiting_since: DateTime<Utc>,
        estimated_duration_minutes: u32,
    ) -> Self {
        Self {
            id: id.into(),
            patient_id: patient_id.into(),
            waiting_since,
            estimated_duration_minutes,
            position: 0,
            estimated_start: None,
        }
    }
}

/// Ambulance ids double as document keys, so only a conservative charset is allowed.
pub fn is_valid_ambulance_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= AMBULANCE_ID_MAX_LEN
        && !id.starts_with('.')
        && id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'))
}
