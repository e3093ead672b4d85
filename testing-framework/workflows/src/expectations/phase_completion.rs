use async_trait::async_trait;
use testing_framework_core::scenario::{DynError, Expectation, Phase, PhaseSummary, RunContext};
use thiserror::Error;

#[derive(Debug, Error)]
enum PhaseCompletionIssue {
    #[error("run stopped in phase {0}")]
    NotDone(Phase),
    #[error("{phase}: {accounted} of {planned} planned operations have a final state")]
    Unaccounted {
        phase: Phase,
        accounted: usize,
        planned: usize,
    },
}

#[derive(Debug, Error)]
#[error("{message}")]
struct PhaseCompletionViolations {
    issues: Vec<PhaseCompletionIssue>,
    message: String,
}

/// Checks that the run reached `Done` and every planned operation of every
/// executed phase ended up succeeded, failed, timed out or not attempted.
#[derive(Clone, Copy, Debug, Default)]
pub struct PhaseCompletion;

impl PhaseCompletion {
    fn check_phase(phase: Phase, summary: &PhaseSummary) -> Option<PhaseCompletionIssue> {
        (summary.accounted() != summary.planned).then_some(PhaseCompletionIssue::Unaccounted {
            phase,
            accounted: summary.accounted(),
            planned: summary.planned,
        })
    }
}

#[async_trait]
impl Expectation for PhaseCompletion {
    fn name(&self) -> &'static str {
        "phase_completion"
    }

    async fn evaluate(&mut self, ctx: &RunContext) -> Result<(), DynError> {
        let report = ctx.report();
        let mut issues = Vec::new();
        if report.final_phase != Phase::Done {
            issues.push(PhaseCompletionIssue::NotDone(report.final_phase));
        }
        issues.extend(
            report
                .phases
                .iter()
                .filter_map(|(phase, summary)| Self::check_phase(*phase, summary)),
        );

        if issues.is_empty() {
            tracing::info!(phases = report.phases.len(), "phase completion satisfied");
            return Ok(());
        }

        let message = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Err(Box::new(PhaseCompletionViolations { issues, message }))
    }
}
