use std::{
    collections::{BTreeMap, BTreeSet, HashMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tracing::debug;

use super::{LedgerClient, LedgerError, Operation, Outcome, PendingHandle};
use crate::topology::{AccountId, Edge};

const MODEL_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Balances held on each side of an open pair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PairBalance {
    low: u64,
    high: u64,
}

impl PairBalance {
    const fn side(&self, edge: Edge, owner: AccountId) -> u64 {
        if owner == edge.low() {
            self.low
        } else {
            self.high
        }
    }

    const fn side_mut(&mut self, edge: Edge, owner: AccountId) -> &mut u64 {
        if owner == edge.low() {
            &mut self.low
        } else {
            &mut self.high
        }
    }
}

#[derive(Debug, Default)]
struct ModelState {
    users: BTreeMap<AccountId, String>,
    pairs: BTreeMap<Edge, PairBalance>,
    receipts: HashMap<String, Outcome>,
    next_tx: u64,
}

impl ModelState {
    fn apply(&mut self, operation: &Operation) -> Outcome {
        let result = match operation {
            Operation::Register { id, label } => self.register(*id, label),
            Operation::CreateAccountPair { u, v, amount } => self.create_pair(*u, *v, *amount),
            Operation::Transfer { from, to } => self.transfer(*from, *to),
            Operation::Close { u, v } => self.close(*u, *v),
            Operation::CloseUser { id } => self.close_user(*id),
        };

        match result {
            Ok(()) => Outcome::success(),
            Err(reason) => Outcome::failure(reason),
        }
    }

    fn register(&mut self, id: AccountId, label: &str) -> Result<(), String> {
        if self.users.contains_key(&id) {
            return Err(format!("user {id} already registered"));
        }
        self.users.insert(id, label.to_owned());
        Ok(())
    }

    fn create_pair(&mut self, u: AccountId, v: AccountId, amount: u64) -> Result<(), String> {
        let edge = Edge::new(u, v).ok_or_else(|| format!("cannot pair user {u} with itself"))?;
        self.ensure_registered(u)?;
        self.ensure_registered(v)?;
        if self.pairs.contains_key(&edge) {
            return Err(format!("pair {u}-{v} already open"));
        }

        let to_v = amount / 2;
        let mut balance = PairBalance::default();
        *balance.side_mut(edge, v) = to_v;
        *balance.side_mut(edge, u) = amount - to_v;
        self.pairs.insert(edge, balance);
        Ok(())
    }

    fn transfer(&mut self, from: AccountId, to: AccountId) -> Result<(), String> {
        self.ensure_registered(from)?;
        self.ensure_registered(to)?;
        if from == to {
            return Err(format!("transfer from user {from} to itself"));
        }

        let path = self
            .shortest_path(from, to)
            .ok_or_else(|| format!("no open path from {from} to {to}"))?;

        for hop in path.windows(2) {
            let (payer, payee) = (hop[0], hop[1]);
            let edge = Edge::new(payer, payee).ok_or("path contains a self-loop")?;
            let available = self.pairs.get(&edge).map_or(0, |b| b.side(edge, payer));
            if available == 0 {
                return Err(format!("insufficient balance for {payer} on pair {payer}-{payee}"));
            }
        }

        for hop in path.windows(2) {
            let (payer, payee) = (hop[0], hop[1]);
            let Some(edge) = Edge::new(payer, payee) else {
                continue;
            };
            if let Some(balance) = self.pairs.get_mut(&edge) {
                *balance.side_mut(edge, payer) -= 1;
                *balance.side_mut(edge, payee) += 1;
            }
        }
        Ok(())
    }

    fn close(&mut self, u: AccountId, v: AccountId) -> Result<(), String> {
        let edge = Edge::new(u, v).ok_or_else(|| format!("cannot close self pair {u}"))?;
        self.pairs
            .remove(&edge)
            .map(|_| ())
            .ok_or_else(|| format!("pair {u}-{v} is not open"))
    }

    fn close_user(&mut self, id: AccountId) -> Result<(), String> {
        self.ensure_registered(id)?;
        let before = self.pairs.len();
        self.pairs.retain(|edge, _| !edge.contains(id));
        if self.pairs.len() == before {
            return Err(format!("user {id} has no open pairs"));
        }
        Ok(())
    }

    fn ensure_registered(&self, id: AccountId) -> Result<(), String> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(format!("user {id} is not registered"))
        }
    }

    fn neighbors(&self, account: AccountId) -> BTreeSet<AccountId> {
        self.pairs
            .keys()
            .filter(|edge| edge.contains(account))
            .map(|edge| {
                if edge.low() == account {
                    edge.high()
                } else {
                    edge.low()
                }
            })
            .collect()
    }

    /// Breadth-first search over open pairs, visiting neighbours in ascending
    /// id order so ties always resolve the same way.
    fn shortest_path(&self, from: AccountId, to: AccountId) -> Option<Vec<AccountId>> {
        let mut parents: BTreeMap<AccountId, AccountId> = BTreeMap::new();
        let mut queue = VecDeque::from([from]);
        parents.insert(from, from);

        while let Some(current) = queue.pop_front() {
            if current == to {
                let mut path = vec![to];
                let mut cursor = to;
                while cursor != from {
                    cursor = parents[&cursor];
                    path.push(cursor);
                }
                path.reverse();
                return Some(path);
            }
            for next in self.neighbors(current) {
                if let std::collections::btree_map::Entry::Vacant(slot) = parents.entry(next) {
                    slot.insert(current);
                    queue.push_back(next);
                }
            }
        }

        None
    }
}

/// Model of the payment service that applies operations to local state.
///
/// Operations take effect at submission and confirm on the first poll. Used
/// for dry runs and to audit what a real ledger should end up holding.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<ModelState>,
}

impl InMemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ModelState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn is_registered(&self, id: AccountId) -> bool {
        self.state().users.contains_key(&id)
    }

    #[must_use]
    pub fn registered_users(&self) -> usize {
        self.state().users.len()
    }

    /// Balance `owner` holds on the pair shared with `counterparty`, if open.
    #[must_use]
    pub fn balance(&self, owner: AccountId, counterparty: AccountId) -> Option<u64> {
        let edge = Edge::new(owner, counterparty)?;
        self.state()
            .pairs
            .get(&edge)
            .map(|balance| balance.side(edge, owner))
    }

    /// Sum of both sides of every open pair. Transfers never change it.
    #[must_use]
    pub fn total_locked(&self) -> u64 {
        self.state()
            .pairs
            .values()
            .map(|balance| balance.low + balance.high)
            .sum()
    }

    #[must_use]
    pub fn open_pairs(&self) -> usize {
        self.state().pairs.len()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn submit(&self, operation: &Operation) -> Result<PendingHandle, LedgerError> {
        let mut state = self.state();
        let outcome = state.apply(operation);
        let id = format!("mem-{:08}", state.next_tx);
        state.next_tx += 1;

        debug!(tx = %id, %operation, success = outcome.success, "model ledger applied operation");
        state.receipts.insert(id.clone(), outcome);
        Ok(PendingHandle::pending(id))
    }

    async fn poll_confirmation(
        &self,
        handle: &PendingHandle,
    ) -> Result<Option<Outcome>, LedgerError> {
        self.state()
            .receipts
            .get(handle.id())
            .cloned()
            .map(Some)
            .ok_or_else(|| LedgerError::Confirmation {
                handle: handle.id().to_owned(),
                source: "unknown transaction".into(),
            })
    }

    fn poll_interval(&self) -> Duration {
        MODEL_POLL_INTERVAL
    }
}
