//! Blocking JSON-RPC 2.0 client for an Ethereum node

use super::{ChainRpc, RpcError};
use crate::core::Address;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPC client over HTTP
pub struct JsonRpcClient {
    url: String,
    client: reqwest::blocking::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `url`; every request gives up after `timeout`
    pub fn new(url: &str, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            url: url.to_string(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = request_body(id, method, params);
        log::debug!("RPC {} -> {}", method, self.url);

        let response = self.client.post(&self.url).json(&body).send()?;
        if !response.status().is_success() {
            return Err(RpcError::InvalidResponse(format!(
                "{} returned HTTP {}",
                method,
                response.status()
            )));
        }
        parse_response(response.json()?)
    }

    fn call_quantity(&self, method: &str, params: Value) -> Result<u128, RpcError> {
        let result = self.call(method, params)?;
        let text = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse(format!("{} result is not a string", method)))?;
        parse_quantity(text)
    }
}

impl ChainRpc for JsonRpcClient {
    fn pending_balance(&self, address: &Address) -> Result<u128, RpcError> {
        self.call_quantity("eth_getBalance", json!([address.to_string(), "pending"]))
    }

    fn pending_nonce(&self, address: &Address) -> Result<u64, RpcError> {
        let nonce = self.call_quantity(
            "eth_getTransactionCount",
            json!([address.to_string(), "pending"]),
        )?;
        u64::try_from(nonce)
            .map_err(|_| RpcError::InvalidResponse(format!("nonce out of range: {}", nonce)))
    }

    fn suggested_gas_price(&self) -> Result<u128, RpcError> {
        self.call_quantity("eth_gasPrice", json!([]))
    }

    fn send_raw_transaction(&self, raw: &[u8]) -> Result<String, RpcError> {
        let result = self.call(
            "eth_sendRawTransaction",
            json!([format!("0x{}", hex::encode(raw))]),
        )?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RpcError::InvalidResponse("transaction hash is not a string".to_string()))
    }
}

fn request_body(id: u64, method: &str, params: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": method,
        "params": params,
    })
}

fn parse_response(body: Value) -> Result<Value, RpcError> {
    let response: RpcResponse = serde_json::from_value(body)
        .map_err(|e| RpcError::InvalidResponse(e.to_string()))?;
    if let Some(error) = response.error {
        return Err(RpcError::Remote {
            code: error.code,
            message: error.message,
        });
    }
    response
        .result
        .ok_or_else(|| RpcError::InvalidResponse("missing result".to_string()))
}

/// Parse a JSON-RPC hex quantity (`0x`-prefixed, no leading zeros required)
pub fn parse_quantity(text: &str) -> Result<u128, RpcError> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| RpcError::InvalidResponse(format!("quantity without 0x: {}", text)))?;
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| RpcError::InvalidResponse(format!("bad quantity: {}", text)))
}
