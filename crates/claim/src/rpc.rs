//! JSON-RPC client for the chain node

use crate::error::{ClaimError, ClaimResult};
use ethabi::{Address, Uint};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Subset of a transaction receipt the relay looks at
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: Option<String>,
    pub block_number: Option<String>,
    pub status: Option<String>,
}

impl TransactionReceipt {
    /// A receipt without a status field predates Byzantium and counts as success
    pub fn succeeded(&self) -> bool {
        match self.status.as_deref() {
            Some(status) => parse_quantity(status).map(|s| !s.is_zero()).unwrap_or(false),
            None => true,
        }
    }
}

/// RPC client for interacting with blockchain
pub struct BlockchainRpcClient {
    rpc_url: String,
    client: reqwest::Client,
}

impl BlockchainRpcClient {
    pub fn new(rpc_url: String) -> Self {
        Self::with_client(reqwest::Client::new(), rpc_url)
    }

    /// Reuse an existing connection pool
    pub fn with_client(client: reqwest::Client, rpc_url: String) -> Self {
        Self { rpc_url, client }
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> ClaimResult<serde_json::Value> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        });

        debug!(method, "rpc call");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ClaimError::Execution(format!("{} request failed: {}", method, e)))?;

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ClaimError::Execution(format!("{} returned an invalid response: {}", method, e)))?;

        if let Some(error) = json.get("error") {
            let message = error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(ClaimError::Execution(message));
        }

        Ok(json
            .get("result")
            .cloned()
            .unwrap_or(serde_json::Value::Null))
    }

    async fn call_quantity(&self, method: &str, params: serde_json::Value) -> ClaimResult<Uint> {
        let result = self.call(method, params).await?;
        result
            .as_str()
            .and_then(parse_quantity)
            .ok_or_else(|| ClaimError::Execution(format!("{} returned a malformed quantity: {}", method, result)))
    }

    pub async fn get_chain_id(&self) -> ClaimResult<u64> {
        let chain_id = self.call_quantity("eth_chainId", serde_json::json!([])).await?;
        if chain_id > Uint::from(u64::MAX) {
            return Err(ClaimError::Execution(format!("eth_chainId out of range: {}", chain_id)));
        }
        Ok(chain_id.as_u64())
    }

    /// Next nonce for `address`, counting transactions still in the mempool
    pub async fn get_transaction_count(&self, address: &Address) -> ClaimResult<Uint> {
        self.call_quantity(
            "eth_getTransactionCount",
            serde_json::json!([format!("0x{}", hex::encode(address.as_bytes())), "pending"]),
        )
        .await
    }

    pub async fn gas_price(&self) -> ClaimResult<Uint> {
        self.call_quantity("eth_gasPrice", serde_json::json!([])).await
    }

    pub async fn send_raw_transaction(&self, tx_data: &str) -> ClaimResult<String> {
        let result = self
            .call("eth_sendRawTransaction", serde_json::json!([tx_data]))
            .await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    pub async fn get_transaction_receipt(&self, tx_hash: &str) -> ClaimResult<Option<TransactionReceipt>> {
        let result = self
            .call("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        serde_json::from_value(result)
            .map(Some)
            .map_err(|e| ClaimError::Execution(format!("malformed receipt for {}: {}", tx_hash, e)))
    }

    /// Poll until the node reports a receipt. There is no timeout.
    pub async fn wait_for_receipt(&self, tx_hash: &str, poll_interval: Duration) -> ClaimResult<TransactionReceipt> {
        loop {
            if let Some(receipt) = self.get_transaction_receipt(tx_hash).await? {
                return Ok(receipt);
            }
            debug!(tx_hash, "receipt not available yet");
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Parse a `0x`-prefixed hex quantity
pub fn parse_quantity(s: &str) -> Option<Uint> {
    let digits = s.strip_prefix("0x")?;
    if digits.is_empty() {
        return Some(Uint::zero());
    }
    Uint::from_str_radix(digits, 16).ok()
}
