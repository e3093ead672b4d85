pub mod context;
mod runner;
pub mod stats;

pub use context::{ExecutionConfig, FailurePolicy, RunContext};
pub use runner::{Runner, ScenarioError};
pub use stats::{BatchResult, OperationRecord, OperationStatus, PhaseSummary, RunReport, RunStats};
