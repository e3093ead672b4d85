pub mod memory;

use std::{fmt, time::Duration};

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::{sleep, timeout};

pub use memory::InMemoryLedger;

use crate::{scenario::DynError, topology::AccountId};

/// A single state-changing call against the payment service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Register {
        id: AccountId,
        label: String,
    },
    CreateAccountPair {
        u: AccountId,
        v: AccountId,
        amount: u64,
    },
    Transfer {
        from: AccountId,
        to: AccountId,
    },
    Close {
        u: AccountId,
        v: AccountId,
    },
    /// Closes every pair the user participates in.
    CloseUser {
        id: AccountId,
    },
}

impl Operation {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::CreateAccountPair { .. } => "create_account_pair",
            Self::Transfer { .. } => "transfer",
            Self::Close { .. } => "close",
            Self::CloseUser { .. } => "close_user",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register { id, label } => write!(f, "register({id}, {label:?})"),
            Self::CreateAccountPair { u, v, amount } => {
                write!(f, "create_account_pair({u}, {v}, {amount})")
            }
            Self::Transfer { from, to } => write!(f, "transfer({from}, {to})"),
            Self::Close { u, v } => write!(f, "close({u}, {v})"),
            Self::CloseUser { id } => write!(f, "close_user({id})"),
        }
    }
}

/// Final result of a confirmed operation. `success == false` is a normal
/// business outcome, not an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub details: Option<String>,
}

impl Outcome {
    #[must_use]
    pub const fn success() -> Self {
        Self {
            success: true,
            details: None,
        }
    }

    #[must_use]
    pub fn failure(details: impl Into<String>) -> Self {
        Self {
            success: false,
            details: Some(details.into()),
        }
    }
}

/// Reference to a submitted operation.
///
/// Adapters may hand back a handle that is already resolved, e.g. when the
/// service rejects the call outright with a business failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingHandle {
    id: String,
    resolved: Option<Outcome>,
}

impl PendingHandle {
    #[must_use]
    pub fn pending(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            resolved: None,
        }
    }

    #[must_use]
    pub fn resolved(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            resolved: Some(outcome),
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn outcome(&self) -> Option<&Outcome> {
        self.resolved.as_ref()
    }
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("failed to submit {operation}: {source}")]
    Submission {
        operation: String,
        #[source]
        source: DynError,
    },
    #[error("operation {handle} not confirmed within {timeout:?}")]
    Timeout { handle: String, timeout: Duration },
    #[error("failed to query confirmation of {handle}: {source}")]
    Confirmation {
        handle: String,
        #[source]
        source: DynError,
    },
}

impl LedgerError {
    pub fn submission(operation: &Operation, source: impl Into<DynError>) -> Self {
        Self::Submission {
            operation: operation.to_string(),
            source: source.into(),
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Remote (or modelled) payment service.
///
/// Implementations are shared across the worker pool and must tolerate
/// concurrent submissions.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Hand an operation to the service. Transport and validation problems
    /// surface as [`LedgerError::Submission`].
    async fn submit(&self, operation: &Operation) -> Result<PendingHandle, LedgerError>;

    /// One confirmation probe. `Ok(None)` means the operation is still
    /// pending.
    async fn poll_confirmation(&self, handle: &PendingHandle)
    -> Result<Option<Outcome>, LedgerError>;

    fn poll_interval(&self) -> Duration;

    /// Poll until the operation resolves or `bound` elapses. Never returns a
    /// partial outcome.
    async fn await_confirmation(
        &self,
        handle: &PendingHandle,
        bound: Duration,
    ) -> Result<Outcome, LedgerError> {
        if let Some(outcome) = handle.outcome() {
            return Ok(outcome.clone());
        }

        let poll = async {
            loop {
                if let Some(outcome) = self.poll_confirmation(handle).await? {
                    return Ok::<_, LedgerError>(outcome);
                }
                sleep(self.poll_interval()).await;
            }
        };

        timeout(bound, poll)
            .await
            .map_err(|_| LedgerError::Timeout {
                handle: handle.id().to_owned(),
                timeout: bound,
            })?
    }
}
