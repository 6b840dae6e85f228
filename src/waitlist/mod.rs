//! Waiting-list core: reconciliation, conflict detection, the mutation
//! abstraction and the optimistic-concurrency orchestrator.

pub mod conflict;
pub mod mutation;
pub mod operations;
pub mod orchestrator;
pub mod reconcile;

pub use conflict::{check_new_entry, check_replacement, ensure_unique, find_conflict};
pub use mutation::{Mutation, MutationOutcome};
pub use operations::{CreateEntry, DeleteEntry, GetEntry, ListEntries, UpdateEntry};
pub use orchestrator::{Applied, ConflictRetryPolicy, UpdateOrchestrator};
pub use reconcile::{reconcile, reconcile_waiting_list};
