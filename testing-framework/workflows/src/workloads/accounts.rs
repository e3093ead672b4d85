use async_trait::async_trait;
use testing_framework_config::constants::DEFAULT_AMOUNT_MEAN;
use testing_framework_core::{
    ledger::Operation,
    sampling::AmountSampler,
    scenario::{DynError, Phase, RunContext, Workload},
    seeded_rng,
    topology::GeneratedTopology,
};

use super::{ACCOUNT_AMOUNT_RNG_STREAM, WorkloadError, util::run_phase};

/// Opens one account pair per topology edge, funded with an exponentially
/// distributed amount.
#[derive(Clone, Debug)]
pub struct AccountPairWorkload {
    amount_mean: f64,
    plan: Option<Vec<Operation>>,
}

impl AccountPairWorkload {
    #[must_use]
    pub const fn new(amount_mean: f64) -> Self {
        Self {
            amount_mean,
            plan: None,
        }
    }

    #[must_use]
    pub const fn amount_mean(&self) -> f64 {
        self.amount_mean
    }

    /// Planned operations, available after init.
    #[must_use]
    pub fn plan(&self) -> Option<&[Operation]> {
        self.plan.as_deref()
    }
}

impl Default for AccountPairWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_AMOUNT_MEAN)
    }
}

#[async_trait]
impl Workload for AccountPairWorkload {
    fn name(&self) -> &'static str {
        "account_pairs"
    }

    fn phase(&self) -> Phase {
        Phase::CreatingAccounts
    }

    fn init(&mut self, topology: &GeneratedTopology) -> Result<(), DynError> {
        let sampler = AmountSampler::new(self.amount_mean).map_err(WorkloadError::from)?;
        let mut rng = seeded_rng(topology.seed(), ACCOUNT_AMOUNT_RNG_STREAM);

        let plan: Vec<Operation> = topology
            .edges()
            .map(|edge| Operation::CreateAccountPair {
                u: edge.low(),
                v: edge.high(),
                amount: sampler.sample(&mut rng),
            })
            .collect();

        tracing::debug!(
            pairs = plan.len(),
            amount_mean = self.amount_mean,
            "account pairs planned"
        );
        self.plan = Some(plan);
        Ok(())
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let plan = self.plan.as_deref().ok_or(WorkloadError::NotInitialized {
            workload: "account_pairs",
        })?;
        let execution = run_phase(ctx, self.phase(), plan).await?;
        tracing::info!(
            opened = execution.success_count,
            planned = plan.len(),
            "account pairs created"
        );
        Ok(())
    }
}
