pub mod ambulance;
pub mod requests;

pub use ambulance::{Ambulance, WaitingListEntry, is_valid_ambulance_id};
pub use requests::{EntryPatchRequest, NEW_ID_SENTINEL, NewAmbulanceRequest, NewEntryRequest};
