use std::{
    num::NonZeroUsize,
    sync::Arc,
    time::{Duration, Instant},
};

use testing_framework_config::CloseMode;
use testing_framework_core::{
    ledger::{InMemoryLedger, LedgerClient as _, LedgerError, Operation, PendingHandle},
    scenario::{
        ExecutionConfig, FailurePolicy, OperationStatus, Phase, RunReport, Scenario,
        ScenarioBuilder, ScenarioError,
    },
};
use testing_framework_workflows::{AccountPairWorkload, RegistrationWorkload, TransferWorkload};
use tests_workflows::{ScenarioBuilderExt as _, Script, ScriptedLedger};

const ACCOUNTS: usize = 10;
const ATTACHMENT: usize = 2;
const BATCHES: usize = 10;
const BATCH_SIZE: usize = 10;
const EDGES: usize = 17;

fn payment_scenario(seed: u64) -> Scenario {
    ScenarioBuilder::topology_with(|t| t.accounts(ACCOUNTS).attachment(ATTACHMENT))
        .with_seed(seed)
        .payment_flow_with(|flow| flow.batches(BATCHES).batch_size(BATCH_SIZE))
        .expect_phase_completion()
        .build()
        .expect("payment scenario builds")
}

/// Per-batch success counts when every third transfer of the run is lost.
/// Batches run one after another, so batch `b` owns transfers
/// `b*K + 1 ..= b*K + K` whatever the order inside the batch.
fn every_third_lost() -> Vec<(usize, usize)> {
    (0..BATCHES)
        .map(|index| {
            let first = index * BATCH_SIZE + 1;
            let lost = (first..first + BATCH_SIZE).filter(|seq| seq % 3 == 0).count();
            (index, BATCH_SIZE - lost)
        })
        .collect()
}

fn fast_execution() -> ExecutionConfig {
    ExecutionConfig::default().with_confirmation_timeout(Duration::from_secs(5))
}

async fn run(
    scenario: &mut Scenario,
    ledger: Arc<ScriptedLedger>,
    execution: ExecutionConfig,
) -> RunReport {
    scenario
        .runner(ledger, execution)
        .run(scenario)
        .await
        .expect("run completes")
}

#[tokio::test]
async fn every_batch_succeeds_against_an_accepting_ledger() {
    let ledger = Arc::new(ScriptedLedger::new(Script::AlwaysSucceed));
    let mut scenario = payment_scenario(42);

    let report = run(&mut scenario, Arc::clone(&ledger), fast_execution()).await;

    let expected: Vec<_> = (0..BATCHES).map(|index| (index, BATCH_SIZE)).collect();
    assert_eq!(report.batch_counts(), expected);
    assert_eq!(report.final_phase, Phase::Done);
    assert_eq!(ledger.transfer_submissions(), BATCHES * BATCH_SIZE);
    // register + create + transfer + close
    assert_eq!(
        ledger.submissions(),
        ACCOUNTS + EDGES + BATCHES * BATCH_SIZE + EDGES
    );
}

#[tokio::test]
async fn batch_counts_do_not_depend_on_concurrency() {
    let ledger = Arc::new(ScriptedLedger::new(Script::AlwaysSucceed));
    let mut scenario = payment_scenario(42);
    let execution = fast_execution().with_concurrency(NonZeroUsize::new(4).unwrap());

    let report = run(&mut scenario, ledger, execution).await;

    assert!(report.batch_counts().iter().all(|&(_, count)| count == BATCH_SIZE));
    assert_eq!(report.batches.len(), BATCHES);
}

#[tokio::test]
async fn every_third_rejected_transfer_submission_lowers_the_batch_count() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectEveryNthTransfer(3)));
    let mut scenario = payment_scenario(42);
    let execution = fast_execution().with_concurrency(NonZeroUsize::new(3).unwrap());

    let report = run(&mut scenario, ledger, execution).await;

    assert_eq!(report.batch_counts(), every_third_lost());

    let transacting = report.phase(Phase::Transacting).expect("transfers recorded");
    assert_eq!(transacting.planned, BATCHES * BATCH_SIZE);
    assert_eq!(transacting.not_attempted, BATCHES * BATCH_SIZE / 3);
    assert_eq!(transacting.accounted(), transacting.planned);
}

#[tokio::test]
async fn every_third_failed_transfer_is_counted_as_a_business_failure() {
    let ledger = Arc::new(ScriptedLedger::new(Script::FailEveryNthTransfer(3)));
    let mut scenario = payment_scenario(42);
    let execution = fast_execution().with_concurrency(NonZeroUsize::new(3).unwrap());

    let report = run(&mut scenario, Arc::clone(&ledger), execution).await;

    assert_eq!(report.batch_counts(), every_third_lost());
    let transacting = report.phase(Phase::Transacting).expect("transfers recorded");
    assert_eq!(transacting.failed, BATCHES * BATCH_SIZE / 3);
    assert_eq!(transacting.not_attempted, 0);
    assert_eq!(transacting.succeeded + transacting.failed, transacting.planned);
    assert_eq!(ledger.transfer_submissions(), BATCHES * BATCH_SIZE);
}

#[tokio::test]
async fn bounded_retries_recover_transient_rejections() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectEveryNthTransfer(3)));
    let mut scenario = payment_scenario(42);
    let execution = fast_execution().with_submit_retries(1, Duration::from_millis(1));

    let report = run(&mut scenario, Arc::clone(&ledger), execution).await;

    assert!(report.batch_counts().iter().all(|&(_, count)| count == BATCH_SIZE));
    assert!(ledger.transfer_submissions() > BATCHES * BATCH_SIZE);
}

#[tokio::test]
async fn unconfirmed_operation_times_out_within_the_bound() {
    let ledger = ScriptedLedger::new(Script::NeverConfirm);
    let bound = Duration::from_millis(50);
    let started = Instant::now();

    let err = ledger
        .await_confirmation(&PendingHandle::pending("never"), bound)
        .await
        .unwrap_err();

    assert!(matches!(err, LedgerError::Timeout { .. }));
    let elapsed = started.elapsed();
    assert!(elapsed >= bound);
    assert!(elapsed < Duration::from_secs(2), "took {elapsed:?}");
}

#[tokio::test]
async fn unconfirmed_transfers_are_recorded_as_timed_out() {
    let ledger = Arc::new(ScriptedLedger::new(Script::NeverConfirm));
    let mut scenario = ScenarioBuilder::with_accounts(4, 1)
        .with_seed(3)
        .with_workload(TransferWorkload::new(1, 3))
        .build()
        .unwrap();
    let execution =
        ExecutionConfig::default().with_confirmation_timeout(Duration::from_millis(50));

    let report = run(&mut scenario, ledger, execution).await;

    assert_eq!(report.batch_counts(), vec![(0, 0)]);
    assert!(
        report.batches[0]
            .records
            .iter()
            .all(|record| record.status == OperationStatus::TimedOut)
    );
    assert_eq!(report.phase(Phase::Transacting).unwrap().timed_out, 3);
}

#[tokio::test]
async fn rejected_submissions_are_recorded_and_the_run_continues() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectAll));
    let mut scenario = payment_scenario(5);

    let report = run(&mut scenario, ledger, fast_execution()).await;

    assert!(report.batch_counts().iter().all(|&(_, count)| count == 0));
    for summary in report.phases.values() {
        assert_eq!(summary.not_attempted, summary.planned);
        assert_eq!(summary.succeeded, 0);
    }
    assert_eq!(report.phase(Phase::Registering).unwrap().planned, ACCOUNTS);
}

#[tokio::test]
async fn strict_mode_aborts_on_registration_failure() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectAll));
    let mut scenario = payment_scenario(5);
    let execution = fast_execution().with_failure_policy(FailurePolicy::AbortOnCriticalFailure);

    let err = scenario
        .runner(ledger.clone(), execution)
        .run(&mut scenario)
        .await
        .unwrap_err();

    let (phase, report) = match err {
        ScenarioError::Aborted { phase, report, .. } => (phase, report),
        other => panic!("expected an aborted run, got {other}"),
    };
    assert_eq!(phase, Phase::Registering);
    assert_eq!(ledger.transfer_submissions(), 0);
    assert!(report.batches.is_empty());
    let registering = report.phase(Phase::Registering).unwrap();
    assert_eq!(registering.not_attempted, ACCOUNTS);
    assert_eq!(report.final_phase, Phase::Registering);
}

#[tokio::test]
async fn strict_mode_keeps_outcomes_of_operations_already_submitted() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectFirstRegistrationAfter(
        Duration::from_millis(50),
    )));
    let mut scenario = payment_scenario(5);
    let execution = fast_execution()
        .with_concurrency(NonZeroUsize::new(4).unwrap())
        .with_failure_policy(FailurePolicy::AbortOnCriticalFailure);

    let err = scenario
        .runner(ledger.clone(), execution)
        .run(&mut scenario)
        .await
        .unwrap_err();

    let report = match err {
        ScenarioError::Aborted {
            phase: Phase::Registering,
            report,
            ..
        } => report,
        other => panic!("expected an aborted registration, got {other}"),
    };
    let registering = report.phase(Phase::Registering).unwrap();
    // Registrations that reached the ledger while register(0) was stalled keep
    // their confirmed outcome.
    assert!(ledger.accepted() > 0);
    assert_eq!(registering.succeeded, ledger.accepted());
    assert_eq!(registering.not_attempted, ACCOUNTS - ledger.accepted());
    assert_eq!(registering.failed + registering.timed_out, 0);
    assert_eq!(registering.accounted(), ACCOUNTS);
}

#[tokio::test]
async fn strict_mode_tolerates_transfer_failures() {
    let ledger = Arc::new(ScriptedLedger::new(Script::RejectEveryNthTransfer(2)));
    let mut scenario = payment_scenario(5);
    let execution = fast_execution().with_failure_policy(FailurePolicy::AbortOnCriticalFailure);

    let report = run(&mut scenario, ledger, execution).await;

    assert_eq!(report.final_phase, Phase::Done);
    assert!(report.batch_counts().iter().all(|&(_, count)| count == BATCH_SIZE / 2));
}

#[tokio::test]
async fn closing_twice_records_failures_without_raising() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut scenario =
        ScenarioBuilder::topology_with(|t| t.accounts(ACCOUNTS).attachment(ATTACHMENT))
            .with_seed(11)
            .payment_flow_with(|flow| flow.batches(2).batch_size(5).close_passes(2))
            .build()
            .unwrap();

    let report = scenario
        .runner(ledger.clone(), fast_execution())
        .run(&mut scenario)
        .await
        .unwrap();

    let closing = report.phase(Phase::ClosingAccounts).unwrap();
    assert_eq!(closing.planned, 2 * EDGES);
    assert_eq!(closing.succeeded, EDGES);
    assert_eq!(closing.failed, EDGES);
    assert_eq!(ledger.open_pairs(), 0);
    assert_eq!(ledger.total_locked(), 0);
}

#[tokio::test]
async fn closing_by_user_empties_the_model() {
    let ledger = Arc::new(InMemoryLedger::new());
    let mut scenario =
        ScenarioBuilder::topology_with(|t| t.accounts(ACCOUNTS).attachment(ATTACHMENT))
            .with_seed(11)
            .payment_flow_with(|flow| flow.batches(1).batch_size(5).close_mode(CloseMode::Users))
            .build()
            .unwrap();

    let report = scenario
        .runner(ledger.clone(), fast_execution())
        .run(&mut scenario)
        .await
        .unwrap();

    assert_eq!(report.phase(Phase::ClosingAccounts).unwrap().planned, ACCOUNTS);
    assert_eq!(ledger.open_pairs(), 0);
}

#[tokio::test]
async fn same_seed_reproduces_the_report() {
    let mut reports = Vec::new();
    for _ in 0..2 {
        let mut scenario = payment_scenario(1234);
        let report = scenario
            .runner(Arc::new(InMemoryLedger::new()), fast_execution())
            .run(&mut scenario)
            .await
            .unwrap();
        reports.push(report);
    }

    assert_eq!(reports[0], reports[1]);
    assert_eq!(reports[0].seed, 1234);
}

#[tokio::test]
async fn transfers_conserve_locked_value() {
    async fn locked_after(with_transfers: bool) -> u64 {
        let ledger = Arc::new(InMemoryLedger::new());
        let mut builder = ScenarioBuilder::with_accounts(ACCOUNTS, ATTACHMENT)
            .with_seed(77)
            .with_workload(RegistrationWorkload::new())
            .with_workload(AccountPairWorkload::new(10.0));
        if with_transfers {
            builder = builder.with_workload(TransferWorkload::new(3, 10));
        }
        let mut scenario = builder.build().unwrap();

        scenario
            .runner(ledger.clone(), fast_execution())
            .run(&mut scenario)
            .await
            .unwrap();

        assert_eq!(ledger.open_pairs(), EDGES);
        ledger.total_locked()
    }

    let before = locked_after(false).await;
    assert!(before > 0);
    assert_eq!(locked_after(true).await, before);
}

#[tokio::test]
async fn batch_indices_continue_across_transfer_workloads() {
    let ledger = Arc::new(ScriptedLedger::new(Script::AlwaysSucceed));
    let mut scenario = ScenarioBuilder::with_accounts(4, 1)
        .with_seed(9)
        .with_workload(TransferWorkload::new(2, 3))
        .with_workload(TransferWorkload::new(1, 5))
        .build()
        .unwrap();

    let report = run(&mut scenario, ledger, fast_execution()).await;

    assert_eq!(report.batch_counts(), vec![(0, 3), (1, 3), (2, 5)]);
}

#[tokio::test]
async fn rejected_registration_is_a_recorded_failure_even_in_strict_mode() {
    let ledger = Arc::new(InMemoryLedger::new());
    let existing = Operation::Register {
        id: 0,
        label: "User0".to_owned(),
    };
    let handle = ledger.submit(&existing).await.unwrap();
    assert!(
        ledger
            .await_confirmation(&handle, Duration::from_secs(1))
            .await
            .unwrap()
            .success
    );

    let mut scenario = payment_scenario(21);
    let execution = fast_execution().with_failure_policy(FailurePolicy::AbortOnCriticalFailure);
    let report = scenario
        .runner(ledger.clone(), execution)
        .run(&mut scenario)
        .await
        .unwrap();

    let registering = report.phase(Phase::Registering).unwrap();
    assert_eq!(registering.failed, 1);
    assert_eq!(registering.succeeded, ACCOUNTS - 1);
    assert_eq!(report.final_phase, Phase::Done);
    assert_eq!(ledger.registered_users(), ACCOUNTS);
}
