//! Scripted ledgers with fixed, predictable behaviour for scenario tests.

use std::{
    sync::atomic::{AtomicU64, AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use testing_framework_core::ledger::{
    LedgerClient, LedgerError, Operation, Outcome, PendingHandle,
};
pub use testing_framework_workflows::ScenarioBuilderExt;
use tokio::time::sleep;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Script {
    /// Accept and confirm everything.
    AlwaysSucceed,
    /// Confirm every `n`th transfer with `success == false`, counting across
    /// the run.
    FailEveryNthTransfer(usize),
    /// Reject every `n`th transfer submission, counting across the run.
    RejectEveryNthTransfer(usize),
    /// Reject the submission of `register(0)` after the given delay and accept
    /// everything else immediately.
    RejectFirstRegistrationAfter(Duration),
    /// Accept submissions but never produce a receipt.
    NeverConfirm,
    /// Reject every submission.
    RejectAll,
}

#[derive(Debug)]
pub struct ScriptedLedger {
    script: Script,
    submissions: AtomicUsize,
    accepted: AtomicUsize,
    transfer_submissions: AtomicUsize,
    next_tx: AtomicU64,
}

impl ScriptedLedger {
    #[must_use]
    pub const fn new(script: Script) -> Self {
        Self {
            script,
            submissions: AtomicUsize::new(0),
            accepted: AtomicUsize::new(0),
            transfer_submissions: AtomicUsize::new(0),
            next_tx: AtomicU64::new(0),
        }
    }

    /// Every submission attempt seen, including rejected ones.
    #[must_use]
    pub fn submissions(&self) -> usize {
        self.submissions.load(Ordering::SeqCst)
    }

    /// Submissions the ledger took and applied.
    #[must_use]
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn transfer_submissions(&self) -> usize {
        self.transfer_submissions.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> String {
        format!("scripted-{}", self.next_tx.fetch_add(1, Ordering::SeqCst))
    }
}

#[async_trait]
impl LedgerClient for ScriptedLedger {
    async fn submit(&self, operation: &Operation) -> Result<PendingHandle, LedgerError> {
        self.submissions.fetch_add(1, Ordering::SeqCst);
        let transfer_seq = matches!(operation, Operation::Transfer { .. })
            .then(|| self.transfer_submissions.fetch_add(1, Ordering::SeqCst) + 1);
        let nth = |n: usize| transfer_seq.is_some_and(|seq| seq % n == 0);

        let rejected = match self.script {
            Script::RejectAll => true,
            Script::RejectEveryNthTransfer(n) => nth(n),
            Script::RejectFirstRegistrationAfter(delay) => {
                let first = matches!(operation, Operation::Register { id: 0, .. });
                if first {
                    sleep(delay).await;
                }
                first
            }
            Script::AlwaysSucceed | Script::FailEveryNthTransfer(_) | Script::NeverConfirm => {
                false
            }
        };
        if rejected {
            return Err(LedgerError::submission(operation, "scripted rejection"));
        }

        self.accepted.fetch_add(1, Ordering::SeqCst);
        if matches!(self.script, Script::FailEveryNthTransfer(n) if nth(n)) {
            return Ok(PendingHandle::resolved(
                self.next_id(),
                Outcome::failure("scripted failure"),
            ));
        }
        Ok(PendingHandle::pending(self.next_id()))
    }

    async fn poll_confirmation(
        &self,
        _handle: &PendingHandle,
    ) -> Result<Option<Outcome>, LedgerError> {
        Ok(match self.script {
            Script::NeverConfirm => None,
            _ => Some(Outcome::success()),
        })
    }

    fn poll_interval(&self) -> Duration {
        Duration::from_millis(1)
    }
}
