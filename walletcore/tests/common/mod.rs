//! A scripted JSON-RPC node for driving the sponsored pipeline without a
//! real chain.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy::primitives::{keccak256, Address, Bytes};
use walletcore::rpc::{HttpClient, HttpError};

/// Mutable chain state behind the mock node.
#[derive(Default)]
struct ChainState {
    /// Account/contract code by address, as `0x` hex.
    codes: HashMap<Address, String>,
    /// Transaction counts by address.
    nonces: HashMap<Address, u64>,
    /// Canned `eth_call` return data by callee address, as `0x` hex.
    call_results: HashMap<Address, String>,
    /// Every raw transaction received, in submission order.
    sent: Vec<Bytes>,
}

/// A JSON-RPC endpoint whose state flips the way a real chain would:
/// submitting a type-4 transaction installs the configured delegation
/// designator on the configured account.
pub struct MockChain {
    chain_id: u64,
    /// `(account, delegate)` applied when a type-4 transaction arrives.
    delegation_on_upgrade: Option<(Address, Address)>,
    state: Mutex<ChainState>,
}

impl MockChain {
    pub fn new(chain_id: u64) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            delegation_on_upgrade: None,
            state: Mutex::new(ChainState::default()),
        })
    }

    /// Like [`Self::new`], but a submitted type-4 transaction delegates
    /// `account` to `delegate`.
    pub fn with_upgrade(
        chain_id: u64,
        account: Address,
        delegate: Address,
    ) -> Arc<Self> {
        Arc::new(Self {
            chain_id,
            delegation_on_upgrade: Some((account, delegate)),
            state: Mutex::new(ChainState::default()),
        })
    }

    pub fn set_nonce(&self, address: Address, nonce: u64) {
        self.state.lock().unwrap().nonces.insert(address, nonce);
    }

    pub fn set_code(&self, address: Address, code: &str) {
        self.state
            .lock()
            .unwrap()
            .codes
            .insert(address, code.to_string());
    }

    pub fn set_call_result(&self, callee: Address, result: &str) {
        self.state
            .lock()
            .unwrap()
            .call_results
            .insert(callee, result.to_string());
    }

    pub fn sent_transactions(&self) -> Vec<Bytes> {
        self.state.lock().unwrap().sent.clone()
    }

    fn handle(&self, method: &str, params: &serde_json::Value) -> String {
        match method {
            "eth_chainId" => format!("\"0x{:x}\"", self.chain_id),
            "eth_gasPrice" => "\"0x3b9aca00\"".to_string(), // 1 gwei
            "eth_getCode" => {
                let address = address_param(params, 0);
                let state = self.state.lock().unwrap();
                let code = state
                    .codes
                    .get(&address)
                    .cloned()
                    .unwrap_or_else(|| "0x".to_string());
                format!("\"{code}\"")
            }
            "eth_getTransactionCount" => {
                let address = address_param(params, 0);
                let nonce = *self
                    .state
                    .lock()
                    .unwrap()
                    .nonces
                    .get(&address)
                    .unwrap_or(&0);
                format!("\"0x{nonce:x}\"")
            }
            "eth_call" => {
                let callee: Address = params[0]["to"]
                    .as_str()
                    .unwrap()
                    .parse()
                    .expect("invalid to address");
                let state = self.state.lock().unwrap();
                let result = state
                    .call_results
                    .get(&callee)
                    .cloned()
                    .unwrap_or_else(|| "0x".to_string());
                format!("\"{result}\"")
            }
            "eth_sendRawTransaction" => {
                let raw: Bytes = params[0]
                    .as_str()
                    .unwrap()
                    .parse()
                    .expect("invalid raw transaction hex");
                let hash = keccak256(&raw);
                let mut state = self.state.lock().unwrap();
                if raw.first() == Some(&0x04) {
                    if let Some((account, delegate)) = self.delegation_on_upgrade
                    {
                        let code =
                            format!("0xef0100{}", hex::encode(delegate));
                        state.codes.insert(account, code);
                    }
                }
                state.sent.push(raw);
                format!("\"{hash}\"")
            }
            other => panic!("mock chain does not implement {other}"),
        }
    }
}

fn address_param(params: &serde_json::Value, index: usize) -> Address {
    params[index]
        .as_str()
        .unwrap()
        .parse()
        .expect("invalid address parameter")
}

#[async_trait::async_trait]
impl HttpClient for MockChain {
    async fn post_json(
        &self,
        _url: &str,
        body: Vec<u8>,
    ) -> Result<Vec<u8>, HttpError> {
        let request: serde_json::Value = serde_json::from_slice(&body).unwrap();
        let method = request["method"].as_str().unwrap();
        let result = self.handle(method, &request["params"]);
        let id = request["id"].clone();
        let response =
            format!(r#"{{"jsonrpc":"2.0","id":{id},"result":{result}}}"#);
        Ok(response.into_bytes())
    }
}
