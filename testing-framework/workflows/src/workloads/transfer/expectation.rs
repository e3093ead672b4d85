use async_trait::async_trait;
use testing_framework_core::scenario::{DynError, Expectation, RunContext};
use thiserror::Error;

#[derive(Debug, Error)]
enum TransferSuccessRateError {
    #[error("no transfer batches were recorded")]
    NoTransfers,
    #[error("transfer success ratio {observed:.3} below floor {min_ratio:.3} ({succeeded}/{planned})")]
    BelowFloor {
        observed: f64,
        min_ratio: f64,
        succeeded: usize,
        planned: usize,
    },
}

/// Checks that the share of confirmed-successful transfers across all
/// batches reaches `min_ratio`.
#[derive(Clone, Copy, Debug)]
pub struct TransferSuccessRate {
    min_ratio: f64,
}

impl TransferSuccessRate {
    #[must_use]
    pub const fn new(min_ratio: f64) -> Self {
        Self { min_ratio }
    }
}

#[async_trait]
impl Expectation for TransferSuccessRate {
    fn name(&self) -> &'static str {
        "transfer_success_rate"
    }

    async fn evaluate(&mut self, ctx: &RunContext) -> Result<(), DynError> {
        let report = ctx.report();
        let planned: usize = report.batches.iter().map(|batch| batch.records.len()).sum();
        if planned == 0 {
            return Err(TransferSuccessRateError::NoTransfers.into());
        }

        let succeeded: usize = report.batches.iter().map(|batch| batch.success_count).sum();
        let observed = succeeded as f64 / planned as f64;
        tracing::info!(succeeded, planned, observed, min_ratio = self.min_ratio, "transfer success rate");

        if observed + f64::EPSILON < self.min_ratio {
            return Err(TransferSuccessRateError::BelowFloor {
                observed,
                min_ratio: self.min_ratio,
                succeeded,
                planned,
            }
            .into());
        }
        Ok(())
    }
}
