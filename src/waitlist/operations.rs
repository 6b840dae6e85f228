//! The waiting-list operations, each expressed as a [`Mutation`].

use tracing::{debug, info, warn};

use super::conflict::{check_new_entry, check_replacement, ensure_unique};
use super::mutation::{Mutation, MutationOutcome};
use super::reconcile::reconcile_waiting_list;
use crate::core::{Result, WaitlistError};
use crate::model::{Ambulance, EntryPatchRequest, WaitingListEntry};

pub const ENTRY_NOT_FOUND_MESSAGE: &str = "Entry not found";
pub const ENTRY_ID_REQUIRED_MESSAGE: &str = "Entry ID is required";

/// Appends a new entry after rejecting duplicate ids and patients.
#[derive(Debug, Clone)]
pub struct CreateEntry {
    entry: WaitingListEntry,
}

impl CreateEntry {
    pub fn new(entry: WaitingListEntry) -> Self {
        Self { entry }
    }
}

impl Mutation for CreateEntry {
    type Output = WaitingListEntry;

    fn name(&self) -> &'static str {
        "create_waiting_list_entry"
    }

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<WaitingListEntry>> {
        if let Err(err) = check_new_entry(&ambulance.waiting_list, &self.entry) {
            warn!(
                ambulance_id = %ambulance.id,
                entry_id = %self.entry.id,
                patient_id = %self.entry.patient_id,
                "entry already exists"
            );
            return Err(err);
        }

        ambulance.waiting_list.push(self.entry.clone());
        reconcile_waiting_list(ambulance);

        let created = ambulance.entry(&self.entry.id).cloned().ok_or_else(|| {
            WaitlistError::inconsistency(format!(
                "entry '{}' missing from waiting list after reconciliation",
                self.entry.id
            ))
        })?;

        debug!(
            ambulance_id = %ambulance.id,
            entry_id = %created.id,
            position = created.position,
            "entry appended to waiting list"
        );
        Ok(MutationOutcome::Changed(created))
    }
}

#[derive(Debug, Clone)]
pub struct DeleteEntry {
    entry_id: String,
}

impl DeleteEntry {
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
        }
    }
}

impl Mutation for DeleteEntry {
    type Output = ();

    fn name(&self) -> &'static str {
        "delete_waiting_list_entry"
    }

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<()>> {
        let index = locate(ambulance, &self.entry_id)?;

        ambulance.waiting_list.remove(index);
        reconcile_waiting_list(ambulance);
        ensure_unique(&ambulance.waiting_list)?;

        Ok(MutationOutcome::Changed(()))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ListEntries;

impl Mutation for ListEntries {
    type Output = Vec<WaitingListEntry>;

    fn name(&self) -> &'static str {
        "list_waiting_list_entries"
    }

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<Vec<WaitingListEntry>>> {
        Ok(MutationOutcome::Unchanged(ambulance.waiting_list.clone()))
    }
}

#[derive(Debug, Clone)]
pub struct GetEntry {
    entry_id: String,
}

impl GetEntry {
    pub fn new(entry_id: impl Into<String>) -> Self {
        Self {
            entry_id: entry_id.into(),
        }
    }
}

impl Mutation for GetEntry {
    type Output = WaitingListEntry;

    fn name(&self) -> &'static str {
        "get_waiting_list_entry"
    }

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<WaitingListEntry>> {
        let index = locate(ambulance, &self.entry_id)?;
        Ok(MutationOutcome::Unchanged(
            ambulance.waiting_list[index].clone(),
        ))
    }
}

/// Merges a partial update into one entry.
///
/// A changed id or patient id is checked against the other entries, so the
/// uniqueness invariants hold after every update.
#[derive(Debug, Clone)]
pub struct UpdateEntry {
    entry_id: String,
    patch: EntryPatchRequest,
}

impl UpdateEntry {
    pub fn new(entry_id: impl Into<String>, patch: EntryPatchRequest) -> Self {
        Self {
            entry_id: entry_id.into(),
            patch,
        }
    }
}

impl Mutation for UpdateEntry {
    type Output = WaitingListEntry;

    fn name(&self) -> &'static str {
        "update_waiting_list_entry"
    }

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<WaitingListEntry>> {
        self.patch.validate()?;
        let index = locate(ambulance, &self.entry_id)?;

        if !self.patch.has_changes() {
            return Ok(MutationOutcome::Unchanged(
                ambulance.waiting_list[index].clone(),
            ));
        }

        let mut updated = ambulance.waiting_list[index].clone();
        self.patch.apply_to(&mut updated);
        if let Err(err) = check_replacement(&ambulance.waiting_list, index, &updated) {
            warn!(
                ambulance_id = %ambulance.id,
                entry_id = %self.entry_id,
                new_entry_id = %updated.id,
                "update would duplicate an existing entry"
            );
            return Err(err);
        }

        let updated_id = updated.id.clone();
        ambulance.waiting_list[index] = updated;
        reconcile_waiting_list(ambulance);
        ensure_unique(&ambulance.waiting_list)?;

        let reconciled = ambulance.entry(&updated_id).cloned().ok_or_else(|| {
            WaitlistError::inconsistency(format!(
                "entry '{updated_id}' missing from waiting list after reconciliation"
            ))
        })?;

        info!(
            ambulance_id = %ambulance.id,
            entry_id = %reconciled.id,
            "entry updated"
        );
        Ok(MutationOutcome::Changed(reconciled))
    }
}

fn locate(ambulance: &Ambulance, entry_id: &str) -> Result<usize> {
    if entry_id.trim().is_empty() {
        return Err(WaitlistError::validation(ENTRY_ID_REQUIRED_MESSAGE));
    }

    ambulance
        .entry_index(entry_id)
        .ok_or_else(|| WaitlistError::not_found(ENTRY_NOT_FOUND_MESSAGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waitlist::conflict::ENTRY_EXISTS_MESSAGE;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 10, 8, minute, 0).unwrap()
    }

    fn ambulance_with(entries: Vec<WaitingListEntry>) -> Ambulance {
        let mut ambulance = Ambulance::new("a1", "Ambulance One");
        ambulance.waiting_list = entries;
        reconcile_waiting_list(&mut ambulance);
        ambulance
    }

    fn patch(json: &str) -> EntryPatchRequest {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn create_inserts_in_arrival_order() {
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e3", "P3", at(20), 10),
        ]);

        let created = CreateEntry::new(WaitingListEntry::new("e2", "P2", at(10), 5))
            .apply(&mut ambulance)
            .unwrap();

        assert!(created.is_changed());
        let created = created.into_output();
        assert_eq!(created.position, 1);
        assert_eq!(created.estimated_start, Some(at(10)));
        let ids: Vec<_> = ambulance.waiting_list.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["e1", "e2", "e3"]);
    }

    #[test]
    fn create_conflict_leaves_aggregate_untouched() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 10)]);
        let before = ambulance.clone();

        let err = CreateEntry::new(WaitingListEntry::new("e2", "P1", at(5), 10))
            .apply(&mut ambulance)
            .unwrap_err();

        assert!(matches!(err, WaitlistError::Conflict(ref m) if m == ENTRY_EXISTS_MESSAGE));
        assert_eq!(ambulance, before);
    }

    #[test]
    fn delete_requires_known_entry() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 10)]);

        let missing = DeleteEntry::new("X").apply(&mut ambulance).unwrap_err();
        assert!(matches!(missing, WaitlistError::NotFound(_)));

        let blank = DeleteEntry::new(" ").apply(&mut ambulance).unwrap_err();
        assert!(matches!(blank, WaitlistError::Validation(_)));

        let deleted = DeleteEntry::new("e1").apply(&mut ambulance).unwrap();
        assert_eq!(deleted, MutationOutcome::Changed(()));
        assert!(ambulance.waiting_list.is_empty());
    }

    #[test]
    fn delete_recomputes_positions_of_followers() {
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e2", "P2", at(5), 10),
            WaitingListEntry::new("e3", "P3", at(9), 10),
        ]);

        DeleteEntry::new("e1").apply(&mut ambulance).unwrap();

        assert_eq!(ambulance.waiting_list[0].id, "e2");
        assert_eq!(ambulance.waiting_list[0].position, 0);
        assert_eq!(ambulance.waiting_list[1].position, 1);
        assert_eq!(ambulance.waiting_list[1].estimated_start, Some(at(15)));
    }

    #[test]
    fn list_and_get_are_read_only() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 10)]);

        let listed = ListEntries.apply(&mut ambulance).unwrap();
        assert!(!listed.is_changed());
        assert_eq!(listed.into_output().len(), 1);

        let fetched = GetEntry::new("e1").apply(&mut ambulance).unwrap();
        assert!(!fetched.is_changed());
        assert_eq!(fetched.into_output().patient_id, "P1");

        let missing = GetEntry::new("nope").apply(&mut ambulance).unwrap_err();
        assert!(matches!(missing, WaitlistError::NotFound(ref m) if m == ENTRY_NOT_FOUND_MESSAGE));
    }

    #[test]
    fn update_merges_only_supplied_fields() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 15)]);

        let updated = UpdateEntry::new("e1", patch(r#"{"estimatedDurationMinutes": 30}"#))
            .apply(&mut ambulance)
            .unwrap()
            .into_output();

        assert_eq!(updated.estimated_duration_minutes, 30);
        assert_eq!(updated.patient_id, "P1");
        assert_eq!(updated.waiting_since, at(0));
    }

    #[test]
    fn update_moving_arrival_returns_entry_at_new_position() {
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e2", "P2", at(5), 10),
        ]);

        let updated = UpdateEntry::new("e1", patch(r#"{"waitingSince": "2024-02-10T08:30:00Z"}"#))
            .apply(&mut ambulance)
            .unwrap()
            .into_output();

        assert_eq!(updated.id, "e1");
        assert_eq!(updated.position, 1);
        assert_eq!(ambulance.waiting_list[0].id, "e2");
    }

    #[test]
    fn update_rejects_identity_collisions() {
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e2", "P2", at(5), 10),
        ]);
        let before = ambulance.clone();

        let taken_patient = UpdateEntry::new("e2", patch(r#"{"patientId": "P1"}"#))
            .apply(&mut ambulance)
            .unwrap_err();
        assert!(matches!(taken_patient, WaitlistError::Conflict(_)));

        let taken_id = UpdateEntry::new("e2", patch(r#"{"id": "e1"}"#))
            .apply(&mut ambulance)
            .unwrap_err();
        assert!(matches!(taken_id, WaitlistError::Conflict(_)));
        assert_eq!(ambulance, before);
    }

    #[test]
    fn update_trims_patient_before_checking_uniqueness() {
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e2", "P2", at(5), 10),
        ]);

        let padded = UpdateEntry::new("e2", patch(r#"{"patientId": " P1 "}"#))
            .apply(&mut ambulance)
            .unwrap_err();
        assert!(matches!(padded, WaitlistError::Conflict(_)));

        let renamed = UpdateEntry::new("e2", patch(r#"{"patientId": " P3 "}"#))
            .apply(&mut ambulance)
            .unwrap()
            .into_output();
        assert_eq!(renamed.patient_id, "P3");
    }

    #[test]
    fn writes_refuse_to_persist_a_list_with_duplicates() {
        // A document written before uniqueness was enforced.
        let mut ambulance = ambulance_with(vec![
            WaitingListEntry::new("e1", "P1", at(0), 10),
            WaitingListEntry::new("e2", "P1", at(5), 10),
            WaitingListEntry::new("e3", "P3", at(9), 10),
        ]);

        let update = UpdateEntry::new("e3", patch(r#"{"estimatedDurationMinutes": 20}"#))
            .apply(&mut ambulance.clone())
            .unwrap_err();
        assert!(matches!(update, WaitlistError::Conflict(_)));

        let delete_other = DeleteEntry::new("e3")
            .apply(&mut ambulance.clone())
            .unwrap_err();
        assert!(matches!(delete_other, WaitlistError::Conflict(_)));

        DeleteEntry::new("e2").apply(&mut ambulance).unwrap();
        assert_eq!(ambulance.waiting_list.len(), 2);
    }

    #[test]
    fn update_can_rename_entry() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 10)]);

        let renamed = UpdateEntry::new("e1", patch(r#"{"id": "triage-1"}"#))
            .apply(&mut ambulance)
            .unwrap()
            .into_output();

        assert_eq!(renamed.id, "triage-1");
        assert!(ambulance.entry("e1").is_none());
    }

    #[test]
    fn empty_update_is_read_only() {
        let mut ambulance = ambulance_with(vec![WaitingListEntry::new("e1", "P1", at(0), 10)]);

        let outcome = UpdateEntry::new("e1", patch("{}"))
            .apply(&mut ambulance)
            .unwrap();
        assert!(!outcome.is_changed());

        let zero = UpdateEntry::new("e1", patch(r#"{"estimatedDurationMinutes": 0}"#))
            .apply(&mut ambulance)
            .unwrap_err();
        assert!(matches!(zero, WaitlistError::Validation(_)));
    }
}
