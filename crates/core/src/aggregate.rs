//! Versioned aggregates and the optimistic write guard stores apply to them.

use crate::error::DomainError;

/// State that is loaded, changed and written back as one unit.
pub trait AggregateRoot {
    type Id: Copy + Eq + core::fmt::Display;

    fn id(&self) -> Self::Id;

    /// Bumped once per applied event. Stores compare it on write.
    fn version(&self) -> u64;
}

/// Version a write expects to find in storage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// First insert or seeding.
    Any,
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }
}

/// Command handling split into a pure decision and a state change.
///
/// `handle` checks the command against current state and returns events
/// without touching `self`; `apply` folds one event in. Stock levels and
/// generated numbers are resolved by the caller, never inside an aggregate.
pub trait Aggregate: AggregateRoot {
    type Command;
    type Event;

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, DomainError>;

    fn apply(&mut self, event: &Self::Event);
}
