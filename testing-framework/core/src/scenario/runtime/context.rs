use std::{num::NonZeroUsize, sync::Arc, time::Duration};

use testing_framework_config::{HarnessConfig, constants::DEFAULT_CONFIRMATION_TIMEOUT, timeouts};

use super::stats::{RunReport, RunStats};
use crate::{
    adjust_timeout,
    ledger::LedgerClient,
    scenario::phase::{Phase, PhaseError, PhaseTracker},
    topology::generation::GeneratedTopology,
};

/// What a workload does when an operation cannot be submitted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the failure and keep going.
    #[default]
    Continue,
    /// Abort the run when a critical phase loses an operation.
    AbortOnCriticalFailure,
}

/// Execution knobs shared by every workload in a run.
#[derive(Clone, Debug)]
pub struct ExecutionConfig {
    pub concurrency: NonZeroUsize,
    pub confirmation_timeout: Duration,
    /// Extra submission attempts after the first one fails.
    pub submit_retries: usize,
    pub retry_delay: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            concurrency: NonZeroUsize::MIN,
            confirmation_timeout: adjust_timeout(DEFAULT_CONFIRMATION_TIMEOUT),
            submit_retries: 0,
            retry_delay: timeouts::submit_retry_delay(),
            failure_policy: FailurePolicy::Continue,
        }
    }
}

impl ExecutionConfig {
    #[must_use]
    pub fn from_harness(config: &HarnessConfig) -> Self {
        Self {
            concurrency: NonZeroUsize::new(config.concurrency).unwrap_or(NonZeroUsize::MIN),
            confirmation_timeout: config.confirmation_timeout(),
            submit_retries: config.submit_retries,
            retry_delay: timeouts::submit_retry_delay(),
            failure_policy: if config.strict {
                FailurePolicy::AbortOnCriticalFailure
            } else {
                FailurePolicy::Continue
            },
        }
    }

    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: NonZeroUsize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub const fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_submit_retries(mut self, retries: usize, delay: Duration) -> Self {
        self.submit_retries = retries;
        self.retry_delay = delay;
        self
    }

    #[must_use]
    pub const fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Shared runtime context available to workloads and expectations.
pub struct RunContext {
    ledger: Arc<dyn LedgerClient>,
    topology: GeneratedTopology,
    execution: ExecutionConfig,
    stats: RunStats,
    phase: PhaseTracker,
}

impl RunContext {
    #[must_use]
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        topology: GeneratedTopology,
        execution: ExecutionConfig,
    ) -> Self {
        Self {
            ledger,
            topology,
            execution,
            stats: RunStats::default(),
            phase: PhaseTracker::default(),
        }
    }

    #[must_use]
    pub fn ledger(&self) -> &dyn LedgerClient {
        self.ledger.as_ref()
    }

    #[must_use]
    pub const fn topology(&self) -> &GeneratedTopology {
        &self.topology
    }

    #[must_use]
    pub const fn execution(&self) -> &ExecutionConfig {
        &self.execution
    }

    #[must_use]
    pub const fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase.current()
    }

    pub fn advance_phase(&self, next: Phase) -> Result<Phase, PhaseError> {
        self.phase.advance(next)
    }

    #[must_use]
    pub fn report(&self) -> RunReport {
        self.stats.snapshot(self.topology.seed(), self.phase())
    }
}
