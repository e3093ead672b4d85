use async_trait::async_trait;
use testing_framework_config::constants::{DEFAULT_BATCH_SIZE, DEFAULT_BATCHES};
use testing_framework_core::{
    ledger::Operation,
    scenario::{BatchResult, DynError, Expectation, Phase, RunContext, Workload},
    seeded_rng,
    topology::GeneratedTopology,
};
use tracing::info;

use super::{
    expectation::TransferSuccessRate,
    selection::{ParticipantSelection, sample_participants},
};
use crate::workloads::{TRANSFER_RNG_STREAM, WorkloadError, util::execute_pooled};

/// Runs `batches` rounds of `batch_size` random single-unit transfers and
/// reports the success count of every round.
#[derive(Clone, Debug)]
pub struct TransferWorkload {
    batches: usize,
    batch_size: usize,
    selection: ParticipantSelection,
    min_success_ratio: Option<f64>,
    plan: Option<Vec<Vec<Operation>>>,
}

impl TransferWorkload {
    #[must_use]
    pub const fn new(batches: usize, batch_size: usize) -> Self {
        Self {
            batches,
            batch_size,
            selection: ParticipantSelection::Registered,
            min_success_ratio: None,
            plan: None,
        }
    }

    #[must_use]
    pub const fn with_selection(mut self, selection: ParticipantSelection) -> Self {
        self.selection = selection;
        self
    }

    /// Attach a [`TransferSuccessRate`] expectation with the given floor.
    #[must_use]
    pub const fn with_min_success_ratio(mut self, ratio: f64) -> Self {
        self.min_success_ratio = Some(ratio);
        self
    }

    #[must_use]
    pub const fn batches(&self) -> usize {
        self.batches
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Planned batches, available after init.
    #[must_use]
    pub fn plan(&self) -> Option<&[Vec<Operation>]> {
        self.plan.as_deref()
    }
}

impl Default for TransferWorkload {
    fn default() -> Self {
        Self::new(DEFAULT_BATCHES, DEFAULT_BATCH_SIZE)
    }
}

#[async_trait]
impl Workload for TransferWorkload {
    fn name(&self) -> &'static str {
        "transfers"
    }

    fn phase(&self) -> Phase {
        Phase::Transacting
    }

    fn expectations(&self) -> Vec<Box<dyn Expectation>> {
        self.min_success_ratio
            .map(|ratio| Box::new(TransferSuccessRate::new(ratio)) as Box<dyn Expectation>)
            .into_iter()
            .collect()
    }

    fn init(&mut self, topology: &GeneratedTopology) -> Result<(), DynError> {
        let accounts = topology.accounts();
        if accounts < 2 {
            return Err(WorkloadError::TooFewParticipants { accounts }.into());
        }

        let mut rng = seeded_rng(topology.seed(), TRANSFER_RNG_STREAM);
        let plan: Vec<Vec<Operation>> = (0..self.batches)
            .map(|_| {
                (0..self.batch_size)
                    .map(|_| {
                        let (from, to) = sample_participants(self.selection, accounts, &mut rng);
                        Operation::Transfer { from, to }
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        tracing::debug!(
            batches = self.batches,
            batch_size = self.batch_size,
            selection = ?self.selection,
            "transfers planned"
        );
        self.plan = Some(plan);
        Ok(())
    }

    async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
        let plan = self.plan.as_deref().ok_or(WorkloadError::NotInitialized {
            workload: "transfers",
        })?;

        // Earlier transfer workloads in the same run keep their indices.
        let first_index = ctx.stats().batch_count();
        for (offset, operations) in plan.iter().enumerate() {
            let index = first_index + offset;
            let execution = execute_pooled(ctx, self.phase(), operations).await;
            ctx.stats()
                .record_phase(self.phase(), operations.len(), &execution.records);

            info!(
                batch = index,
                success_count = execution.success_count,
                planned = operations.len(),
                "transfer batch finished"
            );
            ctx.stats().record_batch(BatchResult {
                index,
                records: execution.records,
                success_count: execution.success_count,
            });
        }
        Ok(())
    }
}
