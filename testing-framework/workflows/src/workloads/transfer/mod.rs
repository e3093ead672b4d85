mod expectation;
pub mod selection;
mod workload;

pub use expectation::TransferSuccessRate;
pub use selection::{DEFAULT_PARTICIPANT_SELECTION, ParticipantSelection, sample_participants};
pub use workload::TransferWorkload;
