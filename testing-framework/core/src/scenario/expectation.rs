use async_trait::async_trait;

use super::{DynError, RunContext};
use crate::topology::generation::GeneratedTopology;

#[async_trait]
/// Defines a check evaluated after every workload has finished.
pub trait Expectation: Send + Sync {
    fn name(&self) -> &str;

    fn init(&mut self, _topology: &GeneratedTopology) -> Result<(), DynError> {
        Ok(())
    }

    async fn evaluate(&mut self, ctx: &RunContext) -> Result<(), DynError>;
}
