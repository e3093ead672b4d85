pub mod builder;
pub mod expectations;
pub mod workloads;

pub use builder::{PaymentFlowBuilder, ScenarioBuilderExt};
pub use expectations::PhaseCompletion;
pub use workloads::{
    WorkloadError,
    accounts::AccountPairWorkload,
    close::CloseWorkload,
    registration::RegistrationWorkload,
    transfer::{ParticipantSelection, TransferSuccessRate, TransferWorkload},
};
