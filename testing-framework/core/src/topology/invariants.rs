use thiserror::Error;

use crate::topology::generation::{AccountGraph, AccountId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyInvariantError {
    #[error("account {account} links to itself")]
    SelfLoop { account: AccountId },
    #[error("edge {a}-{b} is missing from the adjacency of one endpoint")]
    AsymmetricEdge { a: AccountId, b: AccountId },
    #[error("edge set has {edges} entries but adjacency implies {implied}")]
    EdgeCountMismatch { edges: usize, implied: usize },
    #[error("only {reachable} of {accounts} accounts are reachable from account 0")]
    Disconnected { reachable: usize, accounts: usize },
    #[error("account {account} has degree {degree}, below attachment {attachment}")]
    DegreeBelowAttachment {
        account: AccountId,
        degree: usize,
        attachment: usize,
    },
}

/// Validate the structural invariants every generated graph must hold:
/// symmetric adjacency without self-loops, a single connected component, and
/// at least `attachment` neighbours for every account grown after the seed.
pub fn validate_graph(graph: &AccountGraph) -> Result<(), TopologyInvariantError> {
    let mut implied = 0;
    for account in 0..graph.accounts() as AccountId {
        let neighbors = graph.neighbors(account).into_iter().flatten();
        for &neighbor in neighbors {
            if neighbor == account {
                return Err(TopologyInvariantError::SelfLoop { account });
            }
            if !graph.contains_edge(account, neighbor)
                || !graph
                    .neighbors(neighbor)
                    .is_some_and(|back| back.contains(&account))
            {
                return Err(TopologyInvariantError::AsymmetricEdge {
                    a: account,
                    b: neighbor,
                });
            }
            implied += 1;
        }
    }

    if implied != graph.edge_count() * 2 {
        return Err(TopologyInvariantError::EdgeCountMismatch {
            edges: graph.edge_count(),
            implied: implied / 2,
        });
    }

    if !graph.is_connected() {
        return Err(TopologyInvariantError::Disconnected {
            reachable: graph.reachable_from(0),
            accounts: graph.accounts(),
        });
    }

    let attachment = graph.attachment();
    for account in attachment..graph.accounts() {
        let degree = graph.degree(account as AccountId);
        if degree < attachment {
            return Err(TopologyInvariantError::DegreeBelowAttachment {
                account: account as AccountId,
                degree,
                attachment,
            });
        }
    }

    Ok(())
}
