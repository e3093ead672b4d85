use std::sync::Arc;

use runner_examples::payment_scenario;
use testing_framework_config::HarnessConfig;
use testing_framework_core::{
    ledger::InMemoryLedger,
    scenario::{ExecutionConfig, Phase},
};

#[tokio::test]
async fn harness_config_drives_model_run_end_to_end() {
    let config = HarnessConfig {
        accounts: 12,
        attachment: 3,
        batches: 3,
        batch_size: 8,
        seed: Some(21),
        ..HarnessConfig::default()
    };
    let mut scenario = payment_scenario(&config).unwrap();
    assert_eq!(scenario.seed(), 21);

    let ledger = Arc::new(InMemoryLedger::new());
    let report = scenario
        .runner(ledger.clone(), ExecutionConfig::from_harness(&config))
        .run(&mut scenario)
        .await
        .unwrap();

    assert_eq!(report.final_phase, Phase::Done);
    assert_eq!(report.batches.len(), 3);
    assert_eq!(ledger.registered_users(), 12);
    assert_eq!(ledger.open_pairs(), 0);
    assert_eq!(ledger.total_locked(), 0);

    let pairs = report.phase(Phase::CreatingAccounts).unwrap();
    assert_eq!(pairs.planned, scenario.topology().graph().edge_count());
    assert_eq!(pairs.succeeded, pairs.planned);
}
