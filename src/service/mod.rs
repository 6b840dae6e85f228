//! Application services: the entry points used by the HTTP layer.

pub mod ambulances;
pub mod waiting_list;

pub use ambulances::AmbulanceService;
pub use waiting_list::WaitingListService;
