//! Scenario description and execution: a scenario is a generated account
//! topology plus the phase-ordered workloads and expectations that run
//! against a ledger.

mod definition;
mod expectation;
pub mod phase;
pub mod runtime;
mod workload;

pub type DynError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub use definition::{Builder, Scenario, ScenarioBuildError, ScenarioBuilder, TopologyConfigurator};
pub use expectation::Expectation;
pub use phase::{Phase, PhaseError};
pub use runtime::{
    BatchResult, ExecutionConfig, FailurePolicy, OperationRecord, OperationStatus, PhaseSummary,
    RunContext, RunReport, RunStats, Runner, ScenarioError,
};
pub use workload::Workload;
