use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use futures::{StreamExt as _, stream};
use testing_framework_core::{
    ledger::{LedgerError, Operation, PendingHandle},
    scenario::{FailurePolicy, OperationRecord, OperationStatus, Phase, RunContext},
};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::WorkloadError;

const CANCELLED_REASON: &str = "cancelled after a critical submission failure";

/// Ordered outcomes of one pooled execution.
#[derive(Debug)]
pub struct PoolExecution {
    pub records: Vec<OperationRecord>,
    pub success_count: usize,
    /// Set when a critical submission failure stopped the pool early.
    pub aborted: Option<CriticalFailure>,
}

#[derive(Clone, Debug)]
pub struct CriticalFailure {
    pub operation: String,
    pub reason: String,
}

/// Runs `operations` with at most `concurrency` in flight, keeping records in
/// plan order. Successes are tallied on a shared counter as they confirm.
///
/// Under [`FailurePolicy::AbortOnCriticalFailure`] a submission failure in a
/// critical phase stops further submissions. Operations already submitted are
/// still awaited so their real outcome is recorded; only operations that never
/// reached the ledger are reported as not attempted.
pub async fn execute_pooled(
    ctx: &RunContext,
    phase: Phase,
    operations: &[Operation],
) -> PoolExecution {
    let execution = ctx.execution();
    let abort_on_failure =
        phase.is_critical() && execution.failure_policy == FailurePolicy::AbortOnCriticalFailure;
    let successes = AtomicUsize::new(0);
    let cancelled = AtomicBool::new(false);

    let records: Vec<OperationRecord> = {
        let successes = &successes;
        let cancelled = &cancelled;
        stream::iter(operations.iter().cloned())
            .map(move |operation| async move {
                if cancelled.load(Ordering::SeqCst) {
                    return OperationRecord {
                        operation,
                        status: OperationStatus::NotAttempted {
                            reason: CANCELLED_REASON.to_owned(),
                        },
                    };
                }

                let status = execute_operation(ctx, phase, &operation).await;
                if status.is_success() {
                    successes.fetch_add(1, Ordering::Relaxed);
                }
                if abort_on_failure && matches!(status, OperationStatus::NotAttempted { .. }) {
                    cancelled.store(true, Ordering::SeqCst);
                }
                OperationRecord { operation, status }
            })
            .boxed()
            .buffered(execution.concurrency.get())
            .collect()
            .await
    };

    let aborted = if cancelled.into_inner() {
        records.iter().find_map(|record| match &record.status {
            OperationStatus::NotAttempted { reason } if reason != CANCELLED_REASON => {
                Some(CriticalFailure {
                    operation: record.operation.to_string(),
                    reason: reason.clone(),
                })
            }
            _ => None,
        })
    } else {
        None
    };

    PoolExecution {
        success_count: successes.into_inner(),
        records,
        aborted,
    }
}

/// Execute a whole phase plan, record it in the run stats and turn a
/// critical abort into an error.
pub async fn run_phase(
    ctx: &RunContext,
    phase: Phase,
    operations: &[Operation],
) -> Result<PoolExecution, WorkloadError> {
    info!(%phase, planned = operations.len(), "submitting phase operations");
    let mut execution = execute_pooled(ctx, phase, operations).await;
    ctx.stats()
        .record_phase(phase, operations.len(), &execution.records);

    match execution.aborted.take() {
        Some(failure) => Err(WorkloadError::critical(phase, failure)),
        None => Ok(execution),
    }
}

async fn execute_operation(
    ctx: &RunContext,
    phase: Phase,
    operation: &Operation,
) -> OperationStatus {
    let handle = match submit_with_retries(ctx, operation).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(%operation, error = %err, "operation not submitted");
            return OperationStatus::NotAttempted {
                reason: err.to_string(),
            };
        }
    };

    let bound = ctx.execution().confirmation_timeout;
    match ctx.ledger().await_confirmation(&handle, bound).await {
        Ok(outcome) if !outcome.success && phase.is_critical() => {
            warn!(
                %operation,
                %phase,
                handle = handle.id(),
                details = outcome.details.as_deref().unwrap_or_default(),
                "operation rejected by the ledger"
            );
            OperationStatus::Confirmed(outcome)
        }
        Ok(outcome) => {
            debug!(
                %operation,
                handle = handle.id(),
                success = outcome.success,
                details = outcome.details.as_deref().unwrap_or_default(),
                "operation confirmed"
            );
            OperationStatus::Confirmed(outcome)
        }
        Err(err) if err.is_timeout() => {
            warn!(%operation, handle = handle.id(), timeout = ?bound, "confirmation timed out");
            OperationStatus::TimedOut
        }
        Err(err) => {
            warn!(%operation, handle = handle.id(), error = %err, "confirmation failed");
            OperationStatus::Unresolved {
                reason: err.to_string(),
            }
        }
    }
}

/// Submission with the opt-in bounded retry. Only submission failures are
/// retried.
async fn submit_with_retries(
    ctx: &RunContext,
    operation: &Operation,
) -> Result<PendingHandle, LedgerError> {
    let execution = ctx.execution();
    let mut attempt = 0;
    loop {
        match ctx.ledger().submit(operation).await {
            Ok(handle) => return Ok(handle),
            Err(err) if attempt < execution.submit_retries => {
                attempt += 1;
                debug!(%operation, attempt, error = %err, "retrying submission");
                sleep(execution.retry_delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
