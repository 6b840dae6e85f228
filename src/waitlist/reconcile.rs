use chrono::TimeDelta;

use crate::model::{Ambulance, WaitingListEntry};

/// Restores waiting-list ordering and recomputes the derived fields.
///
/// Entries are stable-sorted by `waiting_since`, so arrivals at the same instant
/// keep their insertion order. `position` is the 0-based index in that order.
/// `estimated_start` is the first arrival plus the summed durations of every
/// entry ahead in the queue. The result depends only on the list contents, so
/// applying it twice changes nothing.
pub fn reconcile(mut entries: Vec<WaitingListEntry>) -> Vec<WaitingListEntry> {
    entries.sort_by_key(|entry| entry.waiting_since);

    let anchor = entries.first().map(|entry| entry.waiting_since);
    let mut offset_minutes: i64 = 0;
    for (position, entry) in entries.iter_mut().enumerate() {
        entry.position = position;
        entry.estimated_start = anchor.and_then(|anchor| {
            TimeDelta::try_minutes(offset_minutes)
                .and_then(|offset| anchor.checked_add_signed(offset))
        });
        offset_minutes += i64::from(entry.estimated_duration_minutes);
    }

    entries
}

pub fn reconcile_waiting_list(ambulance: &mut Ambulance) {
    let entries = std::mem::take(&mut ambulance.waiting_list);
    ambulance.waiting_list = reconcile(entries);
}
