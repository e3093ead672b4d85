use testing_framework_config::constants::{
    DEFAULT_ACCOUNTS, DEFAULT_ATTACHMENT, DEFAULT_MAX_ATTACHMENT_ATTEMPTS,
};
use thiserror::Error;
use tracing::info;

use crate::{
    seeded_rng,
    topology::{
        generation::{GeneratedTopology, preferential_attachment},
        invariants::TopologyInvariantError,
    },
};

/// Random stream reserved for graph generation.
pub const TOPOLOGY_RNG_STREAM: u64 = 0;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyBuildError {
    #[error("attachment count {attachment} must be in 1..={accounts}")]
    InvalidParameter { accounts: usize, attachment: usize },
    #[error(
        "attachment search stalled at account {account}: found {found} of {attachment} targets after {attempts} attempts"
    )]
    GraphGenerationStalled {
        account: usize,
        found: usize,
        attachment: usize,
        attempts: usize,
    },
    #[error("max attachment attempts must be non-zero")]
    ZeroAttempts,
    #[error(transparent)]
    Invariants(#[from] TopologyInvariantError),
}

/// High-level settings for the synthetic account graph.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopologyConfig {
    pub accounts: usize,
    pub attachment: usize,
    pub max_attachment_attempts: usize,
}

impl TopologyConfig {
    #[must_use]
    pub const fn new(accounts: usize, attachment: usize) -> Self {
        Self {
            accounts,
            attachment,
            max_attachment_attempts: DEFAULT_MAX_ATTACHMENT_ATTEMPTS,
        }
    }

    /// Create a config with zero accounts; counts must be set before building.
    #[must_use]
    pub const fn empty() -> Self {
        Self::new(0, DEFAULT_ATTACHMENT)
    }
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ACCOUNTS, DEFAULT_ATTACHMENT)
    }
}

/// Builder that produces `GeneratedTopology` instances from a `TopologyConfig`.
#[derive(Clone, Debug)]
pub struct TopologyBuilder {
    config: TopologyConfig,
}

impl TopologyBuilder {
    #[must_use]
    pub const fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &TopologyConfig {
        &self.config
    }

    #[must_use]
    /// Set total account count (N).
    pub const fn with_accounts(mut self, accounts: usize) -> Self {
        self.config.accounts = accounts;
        self
    }

    #[must_use]
    /// Set edges added per new account (m).
    pub const fn with_attachment(mut self, attachment: usize) -> Self {
        self.config.attachment = attachment;
        self
    }

    #[must_use]
    pub const fn with_max_attachment_attempts(mut self, attempts: usize) -> Self {
        self.config.max_attachment_attempts = attempts;
        self
    }

    /// Generate the account graph from the given seed.
    pub fn build(self, seed: u64) -> Result<GeneratedTopology, TopologyBuildError> {
        let Self { config } = self;
        let mut rng = seeded_rng(seed, TOPOLOGY_RNG_STREAM);

        let graph = preferential_attachment(
            config.accounts,
            config.attachment,
            config.max_attachment_attempts,
            &mut rng,
        )?;

        info!(
            accounts = graph.accounts(),
            attachment = graph.attachment(),
            edges = graph.edge_count(),
            seed,
            "generated account graph"
        );

        Ok(GeneratedTopology {
            config,
            graph,
            seed,
        })
    }
}
