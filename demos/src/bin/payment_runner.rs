use std::{process, sync::Arc};

use anyhow::{Context as _, Result};
use runner_examples::{finish_run, payment_scenario};
use testing_framework_config::HarnessConfig;
use testing_framework_core::{
    nodes::{PaymentContractClient, PaymentContractConfig},
    scenario::ExecutionConfig,
};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    runner_examples::defaults::init_tracing();

    if let Err(err) = run().await {
        warn!("payment runner failed: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = HarnessConfig::load().context("loading harness config failed")?;
    info!(
        rpc_url = %config.rpc_url,
        accounts = config.accounts,
        attachment = config.attachment,
        batches = config.batches,
        batch_size = config.batch_size,
        concurrency = config.concurrency,
        "starting payment runner"
    );

    let mut scenario = payment_scenario(&config).context("building payment scenario failed")?;

    let client_config =
        PaymentContractConfig::from_harness(&config).context("invalid contract settings")?;
    let client = PaymentContractClient::connect(client_config)
        .await
        .context("connecting to payment contract failed")?;
    info!(
        sender = %client.sender(),
        contract = %client.contract(),
        "payment contract client ready"
    );

    let result = scenario
        .runner(Arc::new(client), ExecutionConfig::from_harness(&config))
        .run(&mut scenario)
        .await;
    finish_run(result)?;

    info!(seed = scenario.seed(), "payment run complete");
    Ok(())
}
