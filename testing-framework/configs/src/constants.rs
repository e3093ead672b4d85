use std::time::Duration;

/// Default JSON-RPC endpoint of a local development chain.
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8545";

/// Gas budget attached to every contract transaction.
pub const DEFAULT_GAS_LIMIT: u64 = 2_409_638;

/// Default account population size (N).
pub const DEFAULT_ACCOUNTS: usize = 100;

/// Default preferential attachment edges per new account (m).
pub const DEFAULT_ATTACHMENT: usize = 5;

/// Default number of transfer batches (B).
pub const DEFAULT_BATCHES: usize = 10;

/// Default transfers per batch (K).
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Mean of the exponential distribution used for initial pair balances.
pub const DEFAULT_AMOUNT_MEAN: f64 = 10.0;

/// Operations in flight at once. One reproduces a fully sequential run.
pub const DEFAULT_CONCURRENCY: usize = 1;

/// Upper bound on waiting for a single confirmation.
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Interval between receipt polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Attempts per node before the attachment search gives up.
pub const DEFAULT_MAX_ATTACHMENT_ATTEMPTS: usize = 10_000;

/// Label prefix used when registering users.
pub const USER_LABEL_PREFIX: &str = "User";
