use anyhow::{Context as _, Result};
use testing_framework_config::HarnessConfig;
use testing_framework_core::scenario::{
    RunReport, Scenario, ScenarioBuildError, ScenarioBuilder, ScenarioError,
};
use testing_framework_workflows::ScenarioBuilderExt as _;
use tracing::{info, warn};

/// Full payment flow for the shape and seed in `config`.
pub fn payment_scenario(config: &HarnessConfig) -> Result<Scenario, ScenarioBuildError> {
    let mut builder = ScenarioBuilder::topology_with(|t| {
        t.accounts(config.accounts).attachment(config.attachment)
    })
    .payment_flow_with(|flow| flow.from_config(config))
    .expect_phase_completion();

    if let Some(seed) = config.seed {
        builder = builder.with_seed(seed);
    }
    builder.build()
}

/// Print `(batch, success_count)` per line.
pub fn print_batches(report: &RunReport) {
    for (index, success_count) in report.batch_counts() {
        println!("({index}, {success_count})");
    }
}

/// Print whatever the run recorded, including the partial counts of an
/// aborted run, and hand back the report of a completed one.
pub fn finish_run(result: Result<RunReport, ScenarioError>) -> Result<RunReport> {
    match result {
        Ok(report) => {
            print_batches(&report);
            for (phase, summary) in &report.phases {
                info!(
                    %phase,
                    planned = summary.planned,
                    succeeded = summary.succeeded,
                    failed = summary.failed,
                    timed_out = summary.timed_out,
                    not_attempted = summary.not_attempted,
                    "phase summary"
                );
            }
            Ok(report)
        }
        Err(ScenarioError::Aborted {
            name,
            phase,
            source,
            report,
        }) => {
            warn!(workload = %name, %phase, "run aborted; printing partial counts");
            print_batches(&report);
            Err(anyhow::Error::msg(source.to_string()))
                .context(format!("workload '{name}' aborted during {phase}"))
        }
        Err(err) => Err(err).context("running payment scenario failed"),
    }
}
