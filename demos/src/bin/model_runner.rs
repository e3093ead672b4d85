use std::{process, sync::Arc};

use anyhow::{Context as _, Result};
use runner_examples::{finish_run, payment_scenario};
use testing_framework_config::HarnessConfig;
use testing_framework_core::{ledger::InMemoryLedger, scenario::ExecutionConfig};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    runner_examples::defaults::init_tracing();

    if let Err(err) = run().await {
        warn!("model runner failed: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = HarnessConfig::load().context("loading harness config failed")?;
    let mut scenario = payment_scenario(&config).context("building payment scenario failed")?;
    info!(
        accounts = config.accounts,
        edges = scenario.topology().graph().edge_count(),
        seed = scenario.seed(),
        "running payment flow against the model ledger"
    );

    let ledger = Arc::new(InMemoryLedger::new());
    let result = scenario
        .runner(ledger.clone(), ExecutionConfig::from_harness(&config))
        .run(&mut scenario)
        .await;
    finish_run(result)?;

    println!("registered users: {}", ledger.registered_users());
    println!("open pairs: {}", ledger.open_pairs());
    println!("total locked: {}", ledger.total_locked());
    Ok(())
}
