use async_trait::async_trait;
use testing_framework_config::constants::USER_LABEL_PREFIX;
use testing_framework_core::{
    ledger::Operation,
    scenario::{DynError, Phase, RunContext, Workload},
    topology::GeneratedTopology,
};

use super::{WorkloadError, util::run_phase};

/// Registers every account of the topology as `User<id>`.
#[derive(Clone, Debug, Default)]
pub struct RegistrationWorkload {
    plan: Option<Vec<Operation>>,
}

impl RegistrationWorkload {
    #[must_use]
    pub const fn new() -> Self {
        Self { plan: None }
    }
}

#[async_trait]
impl Workload for RegistrationWorkload {
    fn name(&self) -> &'static str {
        "registration"
    }

    fn phase(&self) -> Phase {
        Phase::Registering
    }

    fn init(&mut self, topology: &GeneratedTopology) -> Result<(), DynError> {
        self.plan = Some(
            topology
                .account_ids()
                .map(|id| Operation::Register {
                    id,
                    label: format!("{USER_LABEL_PREFIX}{id}"),
                })
                .collect(),
        );
        Ok(())
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let plan = self.plan.as_deref().ok_or(WorkloadError::NotInitialized {
            workload: "registration",
        })?;
        let execution = run_phase(ctx, self.phase(), plan).await?;
        tracing::info!(
            registered = execution.success_count,
            planned = plan.len(),
            "registration finished"
        );
        Ok(())
    }
}
