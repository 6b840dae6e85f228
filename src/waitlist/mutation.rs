use crate::core::Result;
use crate::model::Ambulance;

/// What a mutation did to the aggregate it was handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome<T> {
    /// Nothing to persist; the output is returned as-is.
    Unchanged(T),
    /// The aggregate was modified and must be saved before `T` is returned.
    Changed(T),
}

impl<T> MutationOutcome<T> {
    pub fn is_changed(&self) -> bool {
        matches!(self, Self::Changed(_))
    }

    pub fn into_output(self) -> T {
        match self {
            Self::Unchanged(output) | Self::Changed(output) => output,
        }
    }
}

/// A read-modify-write step run by the update orchestrator.
///
/// `apply` runs once per attempt against a fresh copy of the aggregate. It
/// must derive everything from that copy and from its own fields, since a
/// version conflict discards the copy and calls `apply` again.
pub trait Mutation: Send + Sync {
    type Output: Send;

    /// Operation name used in spans and log lines.
    fn name(&self) -> &'static str;

    fn apply(&self, ambulance: &mut Ambulance) -> Result<MutationOutcome<Self::Output>>;
}
