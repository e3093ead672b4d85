use rand::Rng;
use testing_framework_core::topology::AccountId;

/// How transfer endpoints are drawn from the account population.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParticipantSelection {
    /// Uniform over the registered ids `[0, N)`.
    #[default]
    Registered,
    /// Uniform over `[0, N]`. Id `N` was never registered, so transfers that
    /// draw it fail at the ledger. Kept to reproduce historical runs.
    InclusiveUpperBound,
}

pub const DEFAULT_PARTICIPANT_SELECTION: ParticipantSelection = ParticipantSelection::Registered;

impl ParticipantSelection {
    fn draw<R>(self, accounts: usize, rng: &mut R) -> AccountId
    where
        R: Rng + ?Sized,
    {
        let accounts = accounts as AccountId;
        match self {
            Self::Registered => rng.gen_range(0..accounts),
            Self::InclusiveUpperBound => rng.gen_range(0..=accounts),
        }
    }
}

/// Draw a `(from, to)` pair with `to != from`. `accounts` must be at least 2.
pub fn sample_participants<R>(
    selection: ParticipantSelection,
    accounts: usize,
    rng: &mut R,
) -> (AccountId, AccountId)
where
    R: Rng + ?Sized,
{
    let from = selection.draw(accounts, rng);
    let mut to = selection.draw(accounts, rng);
    while to == from {
        to = selection.draw(accounts, rng);
    }
    (from, to)
}
