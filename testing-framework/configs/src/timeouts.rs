use std::{env, time::Duration};

pub const CONFIRMATION_TIMEOUT_SECS: u64 = 60;
pub const SUBMIT_RETRY_DELAY_MILLIS: u64 = 500;
pub const RPC_REQUEST_TIMEOUT_SECS: u64 = 30;

fn env_duration(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or_else(|| Duration::from_secs(default))
}

fn env_duration_millis(key: &str, default: u64) -> Duration {
    env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(default))
}

pub fn confirmation_timeout() -> Duration {
    crate::adjust_timeout(env_duration(
        "LEDGER_CONFIRMATION_TIMEOUT_SECS",
        CONFIRMATION_TIMEOUT_SECS,
    ))
}

pub fn submit_retry_delay() -> Duration {
    env_duration_millis("LEDGER_SUBMIT_RETRY_DELAY_MS", SUBMIT_RETRY_DELAY_MILLIS)
}

pub fn rpc_request_timeout() -> Duration {
    crate::adjust_timeout(env_duration(
        "LEDGER_RPC_REQUEST_TIMEOUT_SECS",
        RPC_REQUEST_TIMEOUT_SECS,
    ))
}
