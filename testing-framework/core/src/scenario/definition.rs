use std::sync::Arc;

use rand::RngCore as _;
use thiserror::Error;
use tracing::{debug, info};

use super::{
    DynError, expectation::Expectation, runtime::ExecutionConfig, runtime::Runner,
    workload::Workload,
};
use crate::{
    ledger::LedgerClient,
    scenario::RunContext,
    topology::{
        config::{TopologyBuildError, TopologyBuilder, TopologyConfig},
        generation::GeneratedTopology,
    },
};

#[derive(Debug, Error)]
pub enum ScenarioBuildError {
    #[error(transparent)]
    Topology(#[from] TopologyBuildError),
    #[error("workload '{name}' failed to initialize")]
    WorkloadInit {
        name: String,
        #[source]
        source: DynError,
    },
    #[error("expectation '{name}' failed to initialize")]
    ExpectationInit {
        name: String,
        #[source]
        source: DynError,
    },
}

/// Immutable scenario definition shared between the runner, workloads, and
/// expectations.
pub struct Scenario {
    topology: GeneratedTopology,
    workloads: Vec<Arc<dyn Workload>>,
    expectations: Vec<Box<dyn Expectation>>,
}

impl Scenario {
    #[must_use]
    pub const fn topology(&self) -> &GeneratedTopology {
        &self.topology
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.topology.seed()
    }

    /// Workloads in execution order.
    #[must_use]
    pub fn workloads(&self) -> &[Arc<dyn Workload>] {
        &self.workloads
    }

    #[must_use]
    pub fn expectations(&self) -> &[Box<dyn Expectation>] {
        &self.expectations
    }

    #[must_use]
    pub fn expectations_mut(&mut self) -> &mut [Box<dyn Expectation>] {
        &mut self.expectations
    }

    /// Prepare a runner that drives this scenario against `ledger`.
    #[must_use]
    pub fn runner(&self, ledger: Arc<dyn LedgerClient>, execution: ExecutionConfig) -> Runner {
        Runner::new(RunContext::new(ledger, self.topology.clone(), execution))
    }
}

/// Builder used by callers to describe the desired scenario.
pub struct Builder {
    topology: TopologyBuilder,
    seed: Option<u64>,
    workloads: Vec<Box<dyn Workload>>,
    expectations: Vec<Box<dyn Expectation>>,
}

pub type ScenarioBuilder = Builder;

/// Builder for shaping the scenario topology.
pub struct TopologyConfigurator {
    builder: Builder,
    accounts: usize,
    attachment: Option<usize>,
}

impl Builder {
    #[must_use]
    /// Start a builder from a topology description.
    pub fn new(topology: TopologyBuilder) -> Self {
        Self {
            topology,
            seed: None,
            workloads: Vec::new(),
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_accounts(accounts: usize, attachment: usize) -> Self {
        Self::new(TopologyBuilder::new(TopologyConfig::new(accounts, attachment)))
    }

    /// Convenience constructor that immediately enters topology configuration,
    /// letting callers set counts via `accounts` and `attachment`.
    pub fn topology() -> TopologyConfigurator {
        TopologyConfigurator::new(Self::new(TopologyBuilder::new(TopologyConfig::empty())))
    }

    /// Configure topology via a closure and return the scenario builder.
    #[must_use]
    pub fn topology_with(f: impl FnOnce(TopologyConfigurator) -> TopologyConfigurator) -> Self {
        f(Self::topology()).apply()
    }

    #[must_use]
    /// Fix the seed every random stream of the run derives from.
    pub const fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_workload<W>(mut self, workload: W) -> Self
    where
        W: Workload + 'static,
    {
        self.expectations.extend(workload.expectations());
        self.workloads.push(Box::new(workload));
        self
    }

    #[must_use]
    /// Add a standalone expectation not tied to a workload.
    pub fn with_expectation<E>(mut self, expectation: E) -> Self
    where
        E: Expectation + 'static,
    {
        self.expectations.push(Box::new(expectation));
        self
    }

    /// Generate the topology and let every component plan against it.
    /// Parameter and generation errors surface here, before any ledger call.
    pub fn build(self) -> Result<Scenario, ScenarioBuildError> {
        let Self {
            topology,
            seed,
            mut workloads,
            mut expectations,
        } = self;

        let seed = seed.unwrap_or_else(|| rand::thread_rng().next_u64());
        let generated = topology.build(seed)?;
        initialize_components(&generated, &mut workloads, &mut expectations)?;

        // stable sort keeps insertion order within a phase
        workloads.sort_by_key(|workload| workload.phase());
        let workloads: Vec<Arc<dyn Workload>> = workloads.into_iter().map(Arc::from).collect();

        info!(
            accounts = generated.accounts(),
            edges = generated.graph().edge_count(),
            seed,
            workloads = workloads.len(),
            expectations = expectations.len(),
            "scenario built"
        );

        Ok(Scenario {
            topology: generated,
            workloads,
            expectations,
        })
    }
}

impl TopologyConfigurator {
    const fn new(builder: Builder) -> Self {
        Self {
            builder,
            accounts: 0,
            attachment: None,
        }
    }

    /// Set the number of accounts (N).
    #[must_use]
    pub const fn accounts(mut self, count: usize) -> Self {
        self.accounts = count;
        self
    }

    /// Set the edges each new account attaches with (m).
    #[must_use]
    pub const fn attachment(mut self, count: usize) -> Self {
        self.attachment = Some(count);
        self
    }

    /// Finalize and return the underlying scenario builder.
    #[must_use]
    pub fn apply(self) -> Builder {
        let mut builder = self.builder;
        builder.topology = builder.topology.with_accounts(self.accounts);
        if let Some(attachment) = self.attachment {
            builder.topology = builder.topology.with_attachment(attachment);
        }
        builder
    }
}

fn initialize_components(
    topology: &GeneratedTopology,
    workloads: &mut [Box<dyn Workload>],
    expectations: &mut [Box<dyn Expectation>],
) -> Result<(), ScenarioBuildError> {
    initialize_workloads(topology, workloads)?;
    initialize_expectations(topology, expectations)?;
    Ok(())
}

fn initialize_workloads(
    topology: &GeneratedTopology,
    workloads: &mut [Box<dyn Workload>],
) -> Result<(), ScenarioBuildError> {
    for workload in workloads {
        debug!(workload = workload.name(), phase = %workload.phase(), "initializing workload");
        workload
            .init(topology)
            .map_err(|source| ScenarioBuildError::WorkloadInit {
                name: workload.name().to_owned(),
                source,
            })?;
    }
    Ok(())
}

fn initialize_expectations(
    topology: &GeneratedTopology,
    expectations: &mut [Box<dyn Expectation>],
) -> Result<(), ScenarioBuildError> {
    for expectation in expectations {
        debug!(expectation = expectation.name(), "initializing expectation");
        expectation
            .init(topology)
            .map_err(|source| ScenarioBuildError::ExpectationInit {
                name: expectation.name().to_owned(),
                source,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::scenario::Phase;

    struct Named {
        name: &'static str,
        phase: Phase,
    }

    #[async_trait]
    impl Workload for Named {
        fn name(&self) -> &str {
            self.name
        }

        fn phase(&self) -> Phase {
            self.phase
        }

        async fn start(&self, _ctx: &RunContext) -> Result<(), DynError> {
            Ok(())
        }
    }

    #[test]
    fn invalid_attachment_fails_at_build() {
        let err = ScenarioBuilder::topology_with(|t| t.accounts(3).attachment(4))
            .build()
            .err()
            .unwrap();
        assert!(matches!(
            err,
            ScenarioBuildError::Topology(TopologyBuildError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn workloads_are_ordered_by_phase() {
        let scenario = ScenarioBuilder::with_accounts(5, 2)
            .with_seed(3)
            .with_workload(Named {
                name: "close",
                phase: Phase::ClosingAccounts,
            })
            .with_workload(Named {
                name: "register",
                phase: Phase::Registering,
            })
            .with_workload(Named {
                name: "close-again",
                phase: Phase::ClosingAccounts,
            })
            .build()
            .unwrap();

        let names: Vec<&str> = scenario.workloads().iter().map(|w| w.name()).collect();
        assert_eq!(names, ["register", "close", "close-again"]);
        assert_eq!(scenario.seed(), 3);
    }
}
