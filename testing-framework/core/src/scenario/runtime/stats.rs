use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{
    ledger::{Operation, Outcome},
    scenario::Phase,
};

/// Final state of one planned operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    Confirmed(Outcome),
    /// Submission failed; the service never saw the operation.
    NotAttempted { reason: String },
    /// Submitted but not confirmed within the bound.
    TimedOut,
    /// Submitted but the confirmation query itself failed.
    Unresolved { reason: String },
}

impl OperationStatus {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Confirmed(Outcome { success: true, .. }))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationRecord {
    pub operation: Operation,
    pub status: OperationStatus,
}

/// Ordered outcomes of one transfer batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResult {
    pub index: usize,
    pub records: Vec<OperationRecord>,
    pub success_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhaseSummary {
    pub planned: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub not_attempted: usize,
}

impl PhaseSummary {
    fn absorb(&mut self, planned: usize, records: &[OperationRecord]) {
        self.planned += planned;
        for record in records {
            match &record.status {
                OperationStatus::Confirmed(outcome) if outcome.success => self.succeeded += 1,
                OperationStatus::Confirmed(_) | OperationStatus::Unresolved { .. } => {
                    self.failed += 1;
                }
                OperationStatus::TimedOut => self.timed_out += 1,
                OperationStatus::NotAttempted { .. } => self.not_attempted += 1,
            }
        }
    }

    /// Operations with a recorded final state.
    #[must_use]
    pub const fn accounted(&self) -> usize {
        self.succeeded + self.failed + self.timed_out + self.not_attempted
    }
}

/// Everything a run observed, in phase order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub seed: u64,
    pub final_phase: Phase,
    pub phases: BTreeMap<Phase, PhaseSummary>,
    pub batches: Vec<BatchResult>,
}

impl RunReport {
    /// `(batch index, success count)` for every transfer batch.
    #[must_use]
    pub fn batch_counts(&self) -> Vec<(usize, usize)> {
        self.batches
            .iter()
            .map(|batch| (batch.index, batch.success_count))
            .collect()
    }

    #[must_use]
    pub fn phase(&self, phase: Phase) -> Option<&PhaseSummary> {
        self.phases.get(&phase)
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    phases: BTreeMap<Phase, PhaseSummary>,
    batches: Vec<BatchResult>,
}

/// Shared collector workloads report into.
#[derive(Debug, Default)]
pub struct RunStats {
    inner: Mutex<StatsInner>,
}

impl RunStats {
    fn lock(&self) -> MutexGuard<'_, StatsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add outcomes to a phase. Repeating a phase accumulates into the same
    /// summary.
    pub fn record_phase(&self, phase: Phase, planned: usize, records: &[OperationRecord]) {
        self.lock()
            .phases
            .entry(phase)
            .or_default()
            .absorb(planned, records);
    }

    pub fn record_batch(&self, batch: BatchResult) {
        self.lock().batches.push(batch);
    }

    /// Batches recorded so far in this run.
    #[must_use]
    pub fn batch_count(&self) -> usize {
        self.lock().batches.len()
    }

    #[must_use]
    pub fn summary(&self, phase: Phase) -> Option<PhaseSummary> {
        self.lock().phases.get(&phase).cloned()
    }

    #[must_use]
    pub fn snapshot(&self, seed: u64, final_phase: Phase) -> RunReport {
        let inner = self.lock();
        let mut batches = inner.batches.clone();
        batches.sort_by_key(|batch| batch.index);
        RunReport {
            seed,
            final_phase,
            phases: inner.phases.clone(),
            batches,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(status: OperationStatus) -> OperationRecord {
        OperationRecord {
            operation: Operation::Close { u: 0, v: 1 },
            status,
        }
    }

    #[test]
    fn repeated_phase_accumulates() {
        let stats = RunStats::default();
        stats.record_phase(
            Phase::ClosingAccounts,
            2,
            &[
                record(OperationStatus::Confirmed(Outcome::success())),
                record(OperationStatus::TimedOut),
            ],
        );
        stats.record_phase(
            Phase::ClosingAccounts,
            2,
            &[
                record(OperationStatus::Confirmed(Outcome::failure("closed"))),
                record(OperationStatus::NotAttempted {
                    reason: "transport".to_owned(),
                }),
            ],
        );

        let summary = stats.summary(Phase::ClosingAccounts).unwrap();
        assert_eq!(
            summary,
            PhaseSummary {
                planned: 4,
                succeeded: 1,
                failed: 1,
                timed_out: 1,
                not_attempted: 1,
            }
        );
        assert_eq!(summary.accounted(), summary.planned);
    }

    #[test]
    fn snapshot_orders_batches_by_index() {
        let stats = RunStats::default();
        for index in [2, 0, 1] {
            stats.record_batch(BatchResult {
                index,
                records: Vec::new(),
                success_count: index * 10,
            });
        }

        assert_eq!(stats.batch_count(), 3);
        let report = stats.snapshot(9, Phase::Done);
        assert_eq!(report.batch_counts(), vec![(0, 0), (1, 10), (2, 20)]);
        assert_eq!(report.seed, 9);
    }
}
