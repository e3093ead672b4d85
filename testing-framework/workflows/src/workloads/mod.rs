pub mod accounts;
pub mod close;
pub mod registration;
pub mod transfer;
pub mod util;

use testing_framework_core::{sampling::AmountSamplerError, scenario::Phase};
use thiserror::Error;

/// Random stream for initial pair amounts.
pub const ACCOUNT_AMOUNT_RNG_STREAM: u64 = 1;
/// Random stream for transfer participants.
pub const TRANSFER_RNG_STREAM: u64 = 2;

#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("{workload} started before its operations were planned")]
    NotInitialized { workload: &'static str },
    #[error("transfers need at least two participants (got {accounts})")]
    TooFewParticipants { accounts: usize },
    #[error(transparent)]
    AmountSampler(#[from] AmountSamplerError),
    #[error("{phase} aborted: {operation} could not be submitted: {reason}")]
    CriticalFailure {
        phase: Phase,
        operation: String,
        reason: String,
    },
}

impl WorkloadError {
    fn critical(phase: Phase, failure: util::CriticalFailure) -> Self {
        Self::CriticalFailure {
            phase,
            operation: failure.operation,
            reason: failure.reason,
        }
    }
}
