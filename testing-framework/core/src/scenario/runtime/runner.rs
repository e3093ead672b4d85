use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures::FutureExt as _;
use thiserror::Error;
use tracing::{info, warn};

use super::stats::RunReport;
use crate::scenario::{
    DynError, Expectation, Phase, PhaseError, Scenario, Workload, runtime::context::RunContext,
};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error(transparent)]
    Phase(#[from] PhaseError),
    #[error("workload '{name}' aborted the run during {phase}: {source}")]
    Aborted {
        name: String,
        phase: Phase,
        #[source]
        source: DynError,
        /// Counts recorded up to the abort.
        report: Box<RunReport>,
    },
    #[error("expectations failed:\n{0}")]
    Expectations(#[source] DynError),
}

/// Drives a scenario's workloads phase by phase against one ledger.
pub struct Runner {
    context: Arc<RunContext>,
}

impl Runner {
    #[must_use]
    pub fn new(context: RunContext) -> Self {
        Self {
            context: Arc::new(context),
        }
    }

    /// Access the underlying run context.
    #[must_use]
    pub fn context(&self) -> Arc<RunContext> {
        Arc::clone(&self.context)
    }

    /// Executes every workload in phase order, then evaluates all
    /// expectations. Each phase finishes before the next one starts.
    pub async fn run(self, scenario: &mut Scenario) -> Result<RunReport, ScenarioError> {
        let context = self.context();

        for workload in scenario.workloads() {
            Self::run_workload(&context, workload).await?;
        }
        context.advance_phase(Phase::Done)?;

        let report = context.report();
        info!(
            seed = report.seed,
            batches = report.batches.len(),
            "workloads finished"
        );

        Self::run_expectations(scenario.expectations_mut(), context.as_ref()).await?;
        Ok(report)
    }

    async fn run_workload(
        context: &Arc<RunContext>,
        workload: &Arc<dyn Workload>,
    ) -> Result<(), ScenarioError> {
        let phase = workload.phase();
        let previous = context.advance_phase(phase)?;
        info!(
            workload = workload.name(),
            %phase,
            repeated = previous == phase,
            "phase started"
        );

        let outcome = AssertUnwindSafe(workload.start(context.as_ref()))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| {
                Err(format!("workload panicked: {}", panic_message(panic)).into())
            });

        if let Err(source) = outcome {
            warn!(workload = workload.name(), %phase, error = %source, "workload aborted");
            return Err(ScenarioError::Aborted {
                name: workload.name().to_owned(),
                phase,
                source,
                report: Box::new(context.report()),
            });
        }

        if let Some(summary) = context.stats().summary(phase) {
            info!(
                workload = workload.name(),
                %phase,
                planned = summary.planned,
                succeeded = summary.succeeded,
                failed = summary.failed,
                timed_out = summary.timed_out,
                not_attempted = summary.not_attempted,
                "phase finished"
            );
        }
        Ok(())
    }

    /// Evaluates every registered expectation, aggregating failures so callers
    /// can see all missing conditions in a single report.
    async fn run_expectations(
        expectations: &mut [Box<dyn Expectation>],
        context: &RunContext,
    ) -> Result<(), ScenarioError> {
        let mut failures: Vec<(String, DynError)> = Vec::new();
        for expectation in expectations {
            if let Err(source) = expectation.evaluate(context).await {
                failures.push((expectation.name().to_owned(), source));
            }
        }

        if failures.is_empty() {
            return Ok(());
        }

        let summary = failures
            .into_iter()
            .map(|(name, source)| format!("{name}: {source}"))
            .collect::<Vec<_>>()
            .join("\n");

        Err(ScenarioError::Expectations(summary.into()))
    }
}

/// Attempts to turn a panic payload into a readable string for diagnostics.
fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic.downcast::<String>().map_or_else(
        |panic| {
            panic.downcast::<&'static str>().map_or_else(
                |_| "unknown panic".to_owned(),
                |message| (*message).to_owned(),
            )
        },
        |message| *message,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        ledger::InMemoryLedger,
        scenario::{ExecutionConfig, ScenarioBuilder},
    };

    struct Probe {
        phase: Phase,
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Workload for Probe {
        fn name(&self) -> &str {
            "probe"
        }

        fn phase(&self) -> Phase {
            self.phase
        }

        async fn start(&self, ctx: &RunContext) -> Result<(), DynError> {
            assert_eq!(ctx.phase(), self.phase);
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err("boom".into());
            }
            Ok(())
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Expectation for AlwaysFails {
        fn name(&self) -> &str {
            "always_fails"
        }

        async fn evaluate(&mut self, _ctx: &RunContext) -> Result<(), DynError> {
            Err("nope".into())
        }
    }

    fn probe(phase: Phase, calls: &Arc<AtomicUsize>, fail: bool) -> Probe {
        Probe {
            phase,
            calls: Arc::clone(calls),
            fail,
        }
    }

    #[tokio::test]
    async fn runs_workloads_in_phase_order_and_finishes_done() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scenario = ScenarioBuilder::with_accounts(4, 1)
            .with_seed(1)
            .with_workload(probe(Phase::Transacting, &calls, false))
            .with_workload(probe(Phase::Registering, &calls, false))
            .build()
            .unwrap();

        let runner = scenario.runner(Arc::new(InMemoryLedger::new()), ExecutionConfig::default());
        let context = runner.context();
        let report = runner.run(&mut scenario).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(context.phase(), Phase::Done);
        assert_eq!(report.final_phase, Phase::Done);
    }

    #[tokio::test]
    async fn failing_workload_aborts_remaining_phases() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut scenario = ScenarioBuilder::with_accounts(4, 1)
            .with_seed(1)
            .with_workload(probe(Phase::Registering, &calls, true))
            .with_workload(probe(Phase::Transacting, &calls, false))
            .build()
            .unwrap();

        let err = scenario
            .runner(Arc::new(InMemoryLedger::new()), ExecutionConfig::default())
            .run(&mut scenario)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScenarioError::Aborted {
                phase: Phase::Registering,
                ..
            }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expectation_failures_are_aggregated() {
        let mut scenario = ScenarioBuilder::with_accounts(4, 1)
            .with_seed(1)
            .with_expectation(AlwaysFails)
            .with_expectation(AlwaysFails)
            .build()
            .unwrap();

        let err = scenario
            .runner(Arc::new(InMemoryLedger::new()), ExecutionConfig::default())
            .run(&mut scenario)
            .await
            .unwrap_err();

        match err {
            ScenarioError::Expectations(summary) => {
                assert_eq!(summary.to_string().lines().count(), 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
