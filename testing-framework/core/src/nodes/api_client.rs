use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::trace;

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("failed to decode result of {method}: {source}")]
    Decode {
        method: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid rpc url '{0}'")]
    InvalidUrl(String),
}

impl RpcError {
    /// Node-side rejection whose message reports a contract revert.
    #[must_use]
    pub fn is_revert(&self) -> bool {
        match self {
            Self::Rpc { message, .. } => message.to_ascii_lowercase().contains("revert"),
            _ => false,
        }
    }
}

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<ErrorObject>,
}

impl Envelope {
    fn decode<R>(self, method: &str) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        if let Some(error) = self.error {
            return Err(RpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        serde_json::from_value(self.result.unwrap_or(Value::Null)).map_err(|source| {
            RpcError::Decode {
                method: method.to_owned(),
                source,
            }
        })
    }
}

/// Thin async JSON-RPC 2.0 client. Clones share the connection pool and the
/// request id counter.
#[derive(Clone, Debug)]
pub struct RpcClient {
    url: Url,
    client: Client,
    next_id: Arc<AtomicU64>,
}

impl RpcClient {
    /// Build a client with a per-request timeout.
    pub fn new(url: &str, request_timeout: Duration) -> Result<Self, RpcError> {
        let url = Url::parse(url).map_err(|_| RpcError::InvalidUrl(url.to_owned()))?;
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            url,
            client,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Issue `method` and decode its `result` into `R`. A `null` result
    /// decodes into `Option::None`.
    pub async fn call<R>(&self, method: &str, params: Value) -> Result<R, RpcError>
    where
        R: DeserializeOwned,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(id, method, "rpc request");

        let envelope: Envelope = self
            .client
            .post(self.url.clone())
            .json(&Request {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        envelope.decode(method)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(raw: Value) -> Envelope {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn decodes_typed_result() {
        let accounts: Vec<String> = envelope(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": ["0xabc", "0xdef"]
        }))
        .decode("eth_accounts")
        .unwrap();
        assert_eq!(accounts, vec!["0xabc".to_owned(), "0xdef".to_owned()]);
    }

    #[test]
    fn null_result_decodes_as_none() {
        let receipt: Option<Value> = envelope(json!({"jsonrpc": "2.0", "id": 2, "result": null}))
            .decode("eth_getTransactionReceipt")
            .unwrap();
        assert!(receipt.is_none());
    }

    #[test]
    fn error_object_becomes_rpc_error() {
        let err = envelope(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "error": {"code": -32000, "message": "execution reverted: pair exists"}
        }))
        .decode::<Value>("eth_sendTransaction")
        .unwrap_err();

        assert!(matches!(err, RpcError::Rpc { code: -32000, .. }));
        assert!(err.is_revert());
    }

    #[test]
    fn mistyped_result_is_a_decode_error() {
        let err = envelope(json!({"jsonrpc": "2.0", "id": 4, "result": 12}))
            .decode::<Vec<String>>("eth_accounts")
            .unwrap_err();
        assert!(matches!(err, RpcError::Decode { .. }));
        assert!(!err.is_revert());
    }

    #[test]
    fn rejects_malformed_url() {
        let err = RpcClient::new("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, RpcError::InvalidUrl(_)));
    }
}
