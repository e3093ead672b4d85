use async_trait::async_trait;

use super::{DynError, Expectation, Phase, RunContext};
use crate::topology::generation::GeneratedTopology;

#[async_trait]
/// Describes the operations a scenario submits during one phase.
pub trait Workload: Send + Sync {
    fn name(&self) -> &str;

    /// Phase this workload drives. The runner executes workloads in phase
    /// order.
    fn phase(&self) -> Phase;

    fn expectations(&self) -> Vec<Box<dyn Expectation>> {
        Vec::new()
    }

    /// Plan operations from the generated topology. Runs at scenario build,
    /// before any ledger call.
    fn init(&mut self, _topology: &GeneratedTopology) -> Result<(), DynError> {
        Ok(())
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError>;
}
