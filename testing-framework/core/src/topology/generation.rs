use std::collections::{BTreeSet, VecDeque};

use rand::Rng;
use tracing::debug;

use crate::topology::{
    config::{TopologyBuildError, TopologyConfig},
    invariants::validate_graph,
};

/// Account identifier in `[0, N)`.
pub type AccountId = u64;

/// Undirected relationship between two distinct accounts, stored as
/// `(min, max)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Edge {
    low: AccountId,
    high: AccountId,
}

impl Edge {
    /// Canonicalize an unordered pair. Returns `None` for a self-loop.
    #[must_use]
    pub fn new(a: AccountId, b: AccountId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { low: a, high: b }),
            std::cmp::Ordering::Greater => Some(Self { low: b, high: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    #[must_use]
    pub const fn low(&self) -> AccountId {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> AccountId {
        self.high
    }

    #[must_use]
    pub const fn endpoints(&self) -> (AccountId, AccountId) {
        (self.low, self.high)
    }

    #[must_use]
    pub const fn contains(&self, account: AccountId) -> bool {
        self.low == account || self.high == account
    }
}

/// Connected account graph grown by preferential attachment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountGraph {
    attachment: usize,
    edges: BTreeSet<Edge>,
    adjacency: Vec<BTreeSet<AccountId>>,
}

impl AccountGraph {
    fn with_accounts(accounts: usize, attachment: usize) -> Self {
        Self {
            attachment,
            edges: BTreeSet::new(),
            adjacency: vec![BTreeSet::new(); accounts],
        }
    }

    fn link(&mut self, a: usize, b: usize) {
        let Some(edge) = Edge::new(a as AccountId, b as AccountId) else {
            return;
        };
        if self.edges.insert(edge) {
            self.adjacency[a].insert(b as AccountId);
            self.adjacency[b].insert(a as AccountId);
        }
    }

    #[must_use]
    pub fn accounts(&self) -> usize {
        self.adjacency.len()
    }

    #[must_use]
    pub const fn attachment(&self) -> usize {
        self.attachment
    }

    /// Canonical edges in ascending order.
    #[must_use]
    pub const fn edges(&self) -> &BTreeSet<Edge> {
        &self.edges
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn neighbors(&self, account: AccountId) -> Option<&BTreeSet<AccountId>> {
        self.adjacency.get(usize::try_from(account).ok()?)
    }

    #[must_use]
    pub fn degree(&self, account: AccountId) -> usize {
        self.neighbors(account).map_or(0, BTreeSet::len)
    }

    #[must_use]
    pub fn contains_edge(&self, a: AccountId, b: AccountId) -> bool {
        Edge::new(a, b).is_some_and(|edge| self.edges.contains(&edge))
    }

    /// Number of accounts reachable from `start`, including itself.
    #[must_use]
    pub fn reachable_from(&self, start: AccountId) -> usize {
        let Ok(start) = usize::try_from(start) else {
            return 0;
        };
        if start >= self.accounts() {
            return 0;
        }

        let mut seen = vec![false; self.accounts()];
        let mut queue = VecDeque::from([start]);
        seen[start] = true;
        let mut count = 0;

        while let Some(current) = queue.pop_front() {
            count += 1;
            for &next in &self.adjacency[current] {
                let next = next as usize;
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }

        count
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.accounts() == 0 || self.reachable_from(0) == self.accounts()
    }
}

/// Grow a connected graph over `accounts` nodes where each new node attaches
/// to `attachment` distinct existing nodes, chosen with probability
/// proportional to their current degree.
///
/// The first `attachment` nodes form a complete seed graph. Candidate
/// sampling walks nodes in ascending id order, so a given random stream always
/// produces the same graph. The search for each new node gives up after
/// `max_attempts` draws.
pub fn preferential_attachment<R>(
    accounts: usize,
    attachment: usize,
    max_attempts: usize,
    rng: &mut R,
) -> Result<AccountGraph, TopologyBuildError>
where
    R: Rng + ?Sized,
{
    if attachment < 1 || attachment > accounts {
        return Err(TopologyBuildError::InvalidParameter {
            accounts,
            attachment,
        });
    }
    if max_attempts == 0 {
        return Err(TopologyBuildError::ZeroAttempts);
    }

    let mut graph = AccountGraph::with_accounts(accounts, attachment);
    let mut degrees = vec![attachment - 1; attachment];

    for a in 0..attachment {
        for b in (a + 1)..attachment {
            graph.link(a, b);
        }
    }

    for account in attachment..accounts {
        let total_degree: usize = degrees.iter().sum();
        let mut chosen: Vec<usize> = Vec::with_capacity(attachment);
        let mut attempts = 0;

        while chosen.len() < attachment {
            if attempts == max_attempts {
                return Err(TopologyBuildError::GraphGenerationStalled {
                    account,
                    found: chosen.len(),
                    attachment,
                    attempts,
                });
            }
            attempts += 1;

            let candidate = sample_by_degree(&degrees, total_degree, rng);
            if candidate != account && !chosen.contains(&candidate) {
                chosen.push(candidate);
            }
        }

        degrees.push(0);
        for &target in &chosen {
            graph.link(account, target);
            degrees[target] += 1;
            degrees[account] += 1;
        }

        debug!(account, attempts, targets = ?chosen, "attached account");
    }

    validate_graph(&graph)?;
    Ok(graph)
}

/// Degree-weighted pick over `degrees`. Falls back to a uniform pick when
/// every degree is zero (a single-node seed).
fn sample_by_degree<R>(degrees: &[usize], total_degree: usize, rng: &mut R) -> usize
where
    R: Rng + ?Sized,
{
    if total_degree == 0 {
        return rng.gen_range(0..degrees.len());
    }

    let target = rng.gen_range(0..total_degree);
    let mut cumulative = 0;
    for (idx, degree) in degrees.iter().enumerate() {
        cumulative += degree;
        if cumulative > target {
            return idx;
        }
    }

    degrees.len() - 1
}

/// Generated account graph plus the settings and seed that produced it.
#[derive(Clone, Debug)]
pub struct GeneratedTopology {
    pub(crate) config: TopologyConfig,
    pub(crate) graph: AccountGraph,
    pub(crate) seed: u64,
}

impl GeneratedTopology {
    #[must_use]
    pub const fn config(&self) -> &TopologyConfig {
        &self.config
    }

    #[must_use]
    pub const fn graph(&self) -> &AccountGraph {
        &self.graph
    }

    #[must_use]
    /// Seed shared by every random stream in the scenario.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub fn accounts(&self) -> usize {
        self.graph.accounts()
    }

    /// All account ids in ascending order.
    pub fn account_ids(&self) -> impl Iterator<Item = AccountId> + '_ {
        (0..self.graph.accounts()).map(|id| id as AccountId)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph.edges().iter()
    }
}
