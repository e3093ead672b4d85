use std::{
    fmt,
    sync::{PoisonError, RwLock},
};

use thiserror::Error;

/// Driver phases in the order they must run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Registering,
    CreatingAccounts,
    Transacting,
    ClosingAccounts,
    Done,
}

impl Phase {
    /// Phases whose failures leave later phases without the state they
    /// depend on.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Registering | Self::CreatingAccounts)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Registering => "registering",
            Self::CreatingAccounts => "creating_accounts",
            Self::Transacting => "transacting",
            Self::ClosingAccounts => "closing_accounts",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhaseError {
    #[error("cannot move from phase {from} back to {to}")]
    Backwards { from: Phase, to: Phase },
}

/// Current phase of a run. Moves forward only; re-entering the current phase
/// is allowed.
#[derive(Debug, Default)]
pub struct PhaseTracker {
    current: RwLock<Phase>,
}

impl PhaseTracker {
    #[must_use]
    pub fn current(&self) -> Phase {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn advance(&self, next: Phase) -> Result<Phase, PhaseError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        if next < *current {
            return Err(PhaseError::Backwards {
                from: *current,
                to: next,
            });
        }
        let previous = *current;
        *current = next;
        Ok(previous)
    }
}
