//! JSON-RPC access to the chain through an embedder-provided HTTP client.
//!
//! This layer exposes exactly the reads and the single write the sponsored
//! pipeline needs: code, nonces, gas price, contract views and raw
//! transaction submission. It performs no retries of its own; the
//! delegation poll is the only retry loop in the crate.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, FixedBytes, U128, U64};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

pub use http_client::{HttpClient, HttpError};

/// The injected HTTP transport.
mod http_client;

/// JSON-RPC request ID
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric ID
    Number(u64),
    /// String ID
    String(String),
}

/// JSON-RPC request
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    id: Id,
    method: String,
    params: T,
}

impl<T> JsonRpcRequest<T> {
    /// Create a new JSON-RPC request
    fn new(method: impl Into<String>, id: Id, params: T) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method: method.into(),
            params,
        }
    }
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

/// JSON-RPC error payload
#[derive(Debug, Deserialize)]
struct ErrorPayload {
    code: i64,
    message: String,
}

/// Errors that can occur when interacting with RPC operations.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),
    /// JSON encoding or parsing failed
    #[error("JSON error: {message}")]
    Json {
        /// The error message describing the JSON issue
        message: String,
    },
    /// RPC returned an error response
    #[error("RPC error {code}: {message}")]
    Response {
        /// The error code from the RPC response
        code: i64,
        /// The error message from the RPC response
        message: String,
    },
    /// Invalid response format
    #[error("invalid response format: {message}")]
    InvalidResponse {
        /// The error message describing the format issue
        message: String,
    },
}

/// The `to`/`data` pair of an `eth_call`.
#[derive(Debug, Serialize)]
struct CallRequest {
    to: Address,
    data: Bytes,
}

/// Typed chain access over a JSON-RPC endpoint.
///
/// All methods are single round trips with no retry policy; failures
/// surface to the orchestrating caller.
pub struct EthereumRpc {
    client: Arc<dyn HttpClient>,
    endpoint: String,
    next_id: AtomicU64,
}

impl std::fmt::Debug for EthereumRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EthereumRpc")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl EthereumRpc {
    /// Creates a new RPC handle for `endpoint` over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn HttpClient>, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Performs one JSON-RPC round trip.
    async fn request<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest::new(method, Id::Number(id), params);
        let body = serde_json::to_vec(&request).map_err(|e| RpcError::Json {
            message: e.to_string(),
        })?;

        log::debug!("rpc request {method} (id {id})");
        let raw = self.client.post_json(&self.endpoint, body).await?;

        let response: JsonRpcResponse =
            serde_json::from_slice(&raw).map_err(|e| RpcError::Json {
                message: e.to_string(),
            })?;

        if let Some(error) = response.error {
            return Err(RpcError::Response {
                code: error.code,
                message: error.message,
            });
        }

        let result = response.result.ok_or_else(|| RpcError::InvalidResponse {
            message: format!("{method} response carries neither result nor error"),
        })?;
        serde_json::from_value(result).map_err(|e| RpcError::Json {
            message: e.to_string(),
        })
    }

    /// Returns the endpoint's chain id.
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures.
    pub async fn chain_id(&self) -> Result<u64, RpcError> {
        let id: U64 = self.request("eth_chainId", [(); 0]).await?;
        Ok(id.to::<u64>())
    }

    /// Returns the code deployed at `address` (empty for plain EOAs).
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures.
    pub async fn get_code(&self, address: Address) -> Result<Bytes, RpcError> {
        self.request("eth_getCode", (address, "latest")).await
    }

    /// Returns `address`'s current transaction count.
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures.
    pub async fn transaction_count(
        &self,
        address: Address,
    ) -> Result<u64, RpcError> {
        let count: U64 = self
            .request("eth_getTransactionCount", (address, "latest"))
            .await?;
        Ok(count.to::<u64>())
    }

    /// Returns the endpoint's current gas price in wei.
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures.
    pub async fn gas_price(&self) -> Result<u128, RpcError> {
        let price: U128 = self.request("eth_gasPrice", [(); 0]).await?;
        Ok(price.to::<u128>())
    }

    /// Executes a read-only contract call against the latest block.
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures.
    pub async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, RpcError> {
        self.request("eth_call", (CallRequest { to, data }, "latest"))
            .await
    }

    /// Submits a raw signed transaction, returning its hash.
    ///
    /// # Errors
    /// - Propagates transport, protocol and decoding failures; a node-side
    ///   rejection surfaces as [`RpcError::Response`].
    pub async fn send_raw_transaction(
        &self,
        raw: Bytes,
    ) -> Result<FixedBytes<32>, RpcError> {
        let hash = self.request("eth_sendRawTransaction", (raw,)).await?;
        log::info!("transaction submitted: {hash}");
        Ok(hash)
    }
}
