use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
    time::Duration,
};

use serde::{Deserialize, Serialize};
use testing_framework_env as tf_env;
use thiserror::Error;
use tracing::debug;

use crate::constants::{
    DEFAULT_ACCOUNTS, DEFAULT_AMOUNT_MEAN, DEFAULT_ATTACHMENT, DEFAULT_BATCH_SIZE,
    DEFAULT_BATCHES, DEFAULT_CONCURRENCY, DEFAULT_CONFIRMATION_TIMEOUT, DEFAULT_GAS_LIMIT,
    DEFAULT_POLL_INTERVAL, DEFAULT_RPC_URL,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read harness config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse harness config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{field} must be non-zero")]
    ZeroValue { field: &'static str },
    #[error("attachment ({attachment}) must not exceed accounts ({accounts})")]
    AttachmentExceedsAccounts { attachment: usize, accounts: usize },
    #[error("amount mean must be a positive finite number (got {0})")]
    InvalidAmountMean(f64),
    #[error("unknown close mode '{0}' (expected 'pairs' or 'users')")]
    UnknownCloseMode(String),
}

/// How accounts are torn down at the end of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseMode {
    /// One `closeAcc(u, v)` per generated edge.
    #[default]
    Pairs,
    /// One `closeAcc(id)` per registered user.
    Users,
}

impl FromStr for CloseMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pairs" | "pair" => Ok(Self::Pairs),
            "users" | "user" => Ok(Self::Users),
            other => Err(ConfigError::UnknownCloseMode(other.to_owned())),
        }
    }
}

impl fmt::Display for CloseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pairs => f.write_str("pairs"),
            Self::Users => f.write_str("users"),
        }
    }
}

/// Everything a harness run needs to know, loaded from YAML and/or the
/// environment. Unset fields fall back to the defaults in
/// [`crate::constants`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    pub rpc_url: String,
    pub contract_address: Option<String>,
    pub sender: Option<String>,
    pub gas_limit: u64,
    pub accounts: usize,
    pub attachment: usize,
    pub batches: usize,
    pub batch_size: usize,
    pub amount_mean: f64,
    pub concurrency: usize,
    pub confirmation_timeout_secs: u64,
    pub poll_interval_ms: u64,
    pub submit_retries: usize,
    pub strict: bool,
    pub close_mode: CloseMode,
    pub seed: Option<u64>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            contract_address: None,
            sender: None,
            gas_limit: DEFAULT_GAS_LIMIT,
            accounts: DEFAULT_ACCOUNTS,
            attachment: DEFAULT_ATTACHMENT,
            batches: DEFAULT_BATCHES,
            batch_size: DEFAULT_BATCH_SIZE,
            amount_mean: DEFAULT_AMOUNT_MEAN,
            concurrency: DEFAULT_CONCURRENCY,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            submit_retries: 0,
            strict: false,
            close_mode: CloseMode::default(),
            seed: None,
        }
    }
}

impl HarnessConfig {
    /// Parse a YAML document.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `LEDGER_CONFIG` when set, applies `LEDGER_*` overrides and
    /// validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match tf_env::ledger_config_path() {
            Some(path) => {
                debug!(path = %path.display(), "loading harness config file");
                Self::from_yaml_path(path)?
            }
            None => Self::default(),
        };
        let config = base.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment variables on top of the current values.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Some(url) = tf_env::ledger_rpc_url() {
            self.rpc_url = url;
        }
        if let Some(address) = tf_env::ledger_contract_address() {
            self.contract_address = Some(address);
        }
        if let Some(sender) = tf_env::ledger_sender() {
            self.sender = Some(sender);
        }
        if let Some(gas) = tf_env::ledger_gas_limit() {
            self.gas_limit = gas;
        }
        if let Some(accounts) = tf_env::ledger_accounts() {
            self.accounts = accounts;
        }
        if let Some(attachment) = tf_env::ledger_attachment() {
            self.attachment = attachment;
        }
        if let Some(batches) = tf_env::ledger_batches() {
            self.batches = batches;
        }
        if let Some(batch_size) = tf_env::ledger_batch_size() {
            self.batch_size = batch_size;
        }
        if let Some(mean) = tf_env::ledger_amount_mean() {
            self.amount_mean = mean;
        }
        if let Some(concurrency) = tf_env::ledger_concurrency() {
            self.concurrency = concurrency;
        }
        if let Some(secs) = tf_env::ledger_confirmation_timeout_secs() {
            self.confirmation_timeout_secs = secs;
        }
        if let Some(ms) = tf_env::ledger_poll_interval_ms() {
            self.poll_interval_ms = ms;
        }
        if let Some(retries) = tf_env::ledger_submit_retries() {
            self.submit_retries = retries;
        }
        if let Some(strict) = tf_env::ledger_strict() {
            self.strict = strict;
        }
        if let Some(mode) = tf_env::ledger_close_mode() {
            self.close_mode = mode.parse()?;
        }
        if let Some(seed) = tf_env::ledger_seed() {
            self.seed = Some(seed);
        }
        Ok(self)
    }

    /// Reject shapes that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("accounts", self.accounts),
            ("attachment", self.attachment),
            ("batches", self.batches),
            ("batch_size", self.batch_size),
            ("concurrency", self.concurrency),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroValue { field });
            }
        }
        if self.attachment > self.accounts {
            return Err(ConfigError::AttachmentExceedsAccounts {
                attachment: self.attachment,
                accounts: self.accounts,
            });
        }
        if !self.amount_mean.is_finite() || self.amount_mean <= 0.0 {
            return Err(ConfigError::InvalidAmountMean(self.amount_mean));
        }
        if self.confirmation_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "confirmation_timeout_secs",
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn confirmation_timeout(&self) -> Duration {
        crate::adjust_timeout(Duration::from_secs(self.confirmation_timeout_secs))
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
