use std::{env, path::PathBuf};

#[must_use]
pub fn slow_test_env() -> bool {
    env::var("SLOW_TEST_ENV").is_ok_and(|s| s == "true")
}

#[must_use]
pub fn debug_tracing() -> bool {
    env::var("LEDGER_TESTS_TRACING").is_ok_and(|val| val.eq_ignore_ascii_case("true"))
}

#[must_use]
pub fn ledger_config_path() -> Option<PathBuf> {
    env::var("LEDGER_CONFIG").ok().map(PathBuf::from)
}

#[must_use]
pub fn ledger_rpc_url() -> Option<String> {
    env::var("LEDGER_RPC_URL").ok()
}

#[must_use]
pub fn ledger_contract_address() -> Option<String> {
    env::var("LEDGER_CONTRACT_ADDRESS").ok()
}

#[must_use]
pub fn ledger_sender() -> Option<String> {
    env::var("LEDGER_SENDER").ok()
}

#[must_use]
pub fn ledger_gas_limit() -> Option<u64> {
    parsed("LEDGER_GAS_LIMIT")
}

#[must_use]
pub fn ledger_accounts() -> Option<usize> {
    parsed("LEDGER_ACCOUNTS")
}

#[must_use]
pub fn ledger_attachment() -> Option<usize> {
    parsed("LEDGER_ATTACHMENT")
}

#[must_use]
pub fn ledger_batches() -> Option<usize> {
    parsed("LEDGER_BATCHES")
}

#[must_use]
pub fn ledger_batch_size() -> Option<usize> {
    parsed("LEDGER_BATCH_SIZE")
}

#[must_use]
pub fn ledger_amount_mean() -> Option<f64> {
    parsed("LEDGER_AMOUNT_MEAN")
}

#[must_use]
pub fn ledger_concurrency() -> Option<usize> {
    parsed("LEDGER_CONCURRENCY")
}

#[must_use]
pub fn ledger_confirmation_timeout_secs() -> Option<u64> {
    parsed("LEDGER_CONFIRMATION_TIMEOUT_SECS")
}

#[must_use]
pub fn ledger_poll_interval_ms() -> Option<u64> {
    parsed("LEDGER_POLL_INTERVAL_MS")
}

#[must_use]
pub fn ledger_submit_retries() -> Option<usize> {
    parsed("LEDGER_SUBMIT_RETRIES")
}

#[must_use]
pub fn ledger_strict() -> Option<bool> {
    env::var("LEDGER_STRICT")
        .ok()
        .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
}

#[must_use]
pub fn ledger_close_mode() -> Option<String> {
    env::var("LEDGER_CLOSE_MODE").ok()
}

#[must_use]
pub fn ledger_seed() -> Option<u64> {
    parsed("LEDGER_SEED")
}

fn parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|raw| raw.parse::<T>().ok())
}
