use std::collections::HashSet;

use crate::core::{Result, WaitlistError};
use crate::model::WaitingListEntry;

pub const ENTRY_EXISTS_MESSAGE: &str = "Entry already exists";

/// Returns the first entry sharing `candidate`'s id or patient id.
pub fn find_conflict<'a>(
    entries: &'a [WaitingListEntry],
    candidate: &WaitingListEntry,
) -> Option<&'a WaitingListEntry> {
    entries.iter().find(|existing| clashes(existing, candidate))
}

/// Rejects a new entry whose identity is already taken in `entries`.
pub fn check_new_entry(entries: &[WaitingListEntry], candidate: &WaitingListEntry) -> Result<()> {
    match find_conflict(entries, candidate) {
        Some(_) => Err(WaitlistError::conflict(ENTRY_EXISTS_MESSAGE)),
        None => Ok(()),
    }
}

/// Like [`check_new_entry`], but ignores the entry at `index`, which `candidate` replaces.
pub fn check_replacement(
    entries: &[WaitingListEntry],
    index: usize,
    candidate: &WaitingListEntry,
) -> Result<()> {
    let clash = entries
        .iter()
        .enumerate()
        .any(|(position, existing)| position != index && clashes(existing, candidate));

    if clash {
        Err(WaitlistError::conflict(ENTRY_EXISTS_MESSAGE))
    } else {
        Ok(())
    }
}

/// Verifies that no two entries share an id or a patient id.
pub fn ensure_unique(entries: &[WaitingListEntry]) -> Result<()> {
    let mut ids = HashSet::with_capacity(entries.len());
    let mut patients = HashSet::with_capacity(entries.len());

    for entry in entries {
        if !ids.insert(entry.id.as_str()) {
            return Err(WaitlistError::conflict(format!(
                "Duplicate entry id '{}'",
                entry.id
            )));
        }
        if !patients.insert(entry.patient_id.as_str()) {
            return Err(WaitlistError::conflict(format!(
                "Patient '{}' already has an entry",
                entry.patient_id
            )));
        }
    }

    Ok(())
}

fn clashes(existing: &WaitingListEntry, candidate: &WaitingListEntry) -> bool {
    existing.id == candidate.id || existing.patient_id == candidate.patient_id
}
