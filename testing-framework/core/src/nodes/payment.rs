use std::time::Duration;

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall as _;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use testing_framework_config::{HarnessConfig, timeouts};
use thiserror::Error;
use tracing::{debug, info};

use super::api_client::{RpcClient, RpcError};
use crate::ledger::{LedgerClient, LedgerError, Operation, Outcome, PendingHandle};

mod abi {
    alloy_sol_types::sol! {
        function registerUser(uint256 id, string name);
        function createAcc(uint256 user1, uint256 user2, uint256 amount);
        function sendAmount(uint256 fromUser, uint256 toUser);
        function closeAcc(uint256 user1, uint256 user2);
    }
}

/// The user-keyed teardown shares its name with the pair-keyed one.
mod user_abi {
    alloy_sol_types::sol! {
        function closeAcc(uint256 id);
    }
}

const RECEIPT_SUCCESS: &str = "0x1";

#[derive(Debug, Error)]
pub enum PaymentClientError {
    #[error("payment contract address is not configured")]
    MissingContractAddress,
    #[error("invalid {field} address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
    #[error("node exposes no managed accounts to send from")]
    NoNodeAccounts,
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

/// Connection settings for [`PaymentContractClient`].
#[derive(Clone, Debug)]
pub struct PaymentContractConfig {
    pub rpc_url: String,
    pub contract: Address,
    pub sender: Option<Address>,
    pub gas_limit: u64,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
}

impl PaymentContractConfig {
    pub fn from_harness(config: &HarnessConfig) -> Result<Self, PaymentClientError> {
        let contract = config
            .contract_address
            .as_deref()
            .ok_or(PaymentClientError::MissingContractAddress)
            .and_then(|raw| parse_address("contract", raw))?;
        let sender = config
            .sender
            .as_deref()
            .map(|raw| parse_address("sender", raw))
            .transpose()?;

        Ok(Self {
            rpc_url: config.rpc_url.clone(),
            contract,
            sender,
            gas_limit: config.gas_limit,
            poll_interval: config.poll_interval(),
            request_timeout: timeouts::rpc_request_timeout(),
        })
    }
}

fn parse_address(field: &'static str, raw: &str) -> Result<Address, PaymentClientError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| PaymentClientError::InvalidAddress {
            field,
            value: raw.to_owned(),
        })
}

#[derive(Debug, Deserialize)]
struct Receipt {
    #[serde(default)]
    status: Option<String>,
}

fn receipt_outcome(receipt: &Receipt) -> Outcome {
    match receipt.status.as_deref() {
        Some(RECEIPT_SUCCESS) => Outcome::success(),
        Some(status) => Outcome::failure(format!("receipt status {status}")),
        None => Outcome::failure("receipt carries no status"),
    }
}

/// ABI calldata for one operation.
#[must_use]
pub fn encode_operation(operation: &Operation) -> Vec<u8> {
    let word = |value: u64| U256::from(value);
    match operation {
        Operation::Register { id: user, label } => abi::registerUserCall {
            id: word(*user),
            name: label.clone(),
        }
        .abi_encode(),
        Operation::CreateAccountPair { u, v, amount } => abi::createAccCall {
            user1: word(*u),
            user2: word(*v),
            amount: word(*amount),
        }
        .abi_encode(),
        Operation::Transfer { from, to } => abi::sendAmountCall {
            fromUser: word(*from),
            toUser: word(*to),
        }
        .abi_encode(),
        Operation::Close { u, v } => abi::closeAccCall {
            user1: word(*u),
            user2: word(*v),
        }
        .abi_encode(),
        Operation::CloseUser { id: user } => user_abi::closeAccCall { id: word(*user) }.abi_encode(),
    }
}

/// Ledger adapter for the deployed payment contract, sending transactions
/// from a node-managed account with a fixed gas budget.
#[derive(Clone, Debug)]
pub struct PaymentContractClient {
    rpc: RpcClient,
    contract: Address,
    sender: Address,
    gas_limit: u64,
    poll_interval: Duration,
}

impl PaymentContractClient {
    /// Connect to the node and resolve the sender, falling back to the
    /// node's first managed account.
    pub async fn connect(config: PaymentContractConfig) -> Result<Self, PaymentClientError> {
        let rpc = RpcClient::new(&config.rpc_url, config.request_timeout)?;
        let sender = match config.sender {
            Some(sender) => sender,
            None => {
                let accounts: Vec<String> = rpc.call("eth_accounts", json!([])).await?;
                let first = accounts.first().ok_or(PaymentClientError::NoNodeAccounts)?;
                parse_address("sender", first)?
            }
        };

        info!(
            url = %rpc.url(),
            contract = %config.contract,
            %sender,
            gas_limit = config.gas_limit,
            "payment contract client ready"
        );

        Ok(Self {
            rpc,
            contract: config.contract,
            sender,
            gas_limit: config.gas_limit,
            poll_interval: config.poll_interval,
        })
    }

    #[must_use]
    pub const fn sender(&self) -> Address {
        self.sender
    }

    #[must_use]
    pub const fn contract(&self) -> Address {
        self.contract
    }
}

#[async_trait]
impl LedgerClient for PaymentContractClient {
    async fn submit(&self, operation: &Operation) -> Result<PendingHandle, LedgerError> {
        let calldata = encode_operation(operation);
        let params = json!([{
            "from": self.sender.to_string(),
            "to": self.contract.to_string(),
            "data": format!("0x{}", hex::encode(calldata)),
            "gas": format!("{:#x}", self.gas_limit),
        }]);

        match self.rpc.call::<String>("eth_sendTransaction", params).await {
            Ok(tx_hash) => {
                debug!(%operation, %tx_hash, "transaction sent");
                Ok(PendingHandle::pending(tx_hash))
            }
            Err(err) if err.is_revert() => {
                debug!(%operation, error = %err, "transaction rejected by contract");
                Ok(PendingHandle::resolved(
                    format!("rejected:{operation}"),
                    Outcome::failure(err.to_string()),
                ))
            }
            Err(err) => Err(LedgerError::submission(operation, err)),
        }
    }

    async fn poll_confirmation(
        &self,
        handle: &PendingHandle,
    ) -> Result<Option<Outcome>, LedgerError> {
        let receipt: Option<Receipt> = self
            .rpc
            .call("eth_getTransactionReceipt", json!([handle.id()]))
            .await
            .map_err(|source| LedgerError::Confirmation {
                handle: handle.id().to_owned(),
                source: source.into(),
            })?;

        Ok(receipt.as_ref().map(receipt_outcome))
    }

    fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
