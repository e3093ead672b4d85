use async_trait::async_trait;
use testing_framework_config::CloseMode;
use testing_framework_core::{
    ledger::Operation,
    scenario::{DynError, Phase, RunContext, Workload},
    topology::GeneratedTopology,
};

use super::{WorkloadError, util::run_phase};

/// Tears the account pairs down, either one `close(u, v)` per edge or one
/// user-keyed close per account.
///
/// Adding a second instance to a scenario re-closes the same pairs; the
/// ledger reports those as failures and the run carries on.
#[derive(Clone, Debug, Default)]
pub struct CloseWorkload {
    mode: CloseMode,
    plan: Option<Vec<Operation>>,
}

impl CloseWorkload {
    #[must_use]
    pub const fn new(mode: CloseMode) -> Self {
        Self { mode, plan: None }
    }

    #[must_use]
    pub const fn mode(&self) -> CloseMode {
        self.mode
    }
}

#[async_trait]
impl Workload for CloseWorkload {
    fn name(&self) -> &'static str {
        "close_accounts"
    }

    fn phase(&self) -> Phase {
        Phase::ClosingAccounts
    }

    fn init(&mut self, topology: &GeneratedTopology) -> Result<(), DynError> {
        let plan = match self.mode {
            CloseMode::Pairs => topology
                .edges()
                .map(|edge| Operation::Close {
                    u: edge.low(),
                    v: edge.high(),
                })
                .collect(),
            CloseMode::Users => topology
                .account_ids()
                .map(|id| Operation::CloseUser { id })
                .collect(),
        };
        self.plan = Some(plan);
        Ok(())
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let plan = self.plan.as_deref().ok_or(WorkloadError::NotInitialized {
            workload: "close_accounts",
        })?;
        let execution = run_phase(ctx, self.phase(), plan).await?;
        tracing::info!(
            mode = %self.mode,
            closed = execution.success_count,
            planned = plan.len(),
            "accounts closed"
        );
        Ok(())
    }
}
