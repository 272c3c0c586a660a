//! JSON-RPC client for EVM nodes
//!
//! This module provides the node interactions the invoice client needs:
//! - Contract reads (`eth_call`)
//! - Transaction submission and receipt polling
//! - Nonce, gas price and gas estimation
//! - Network status

use crate::abi;
use crate::types::{
    parse_hash, parse_quantity, parse_quantity_u64, NetworkInfo, TransactionReceipt,
    TransactionStatus,
};
use crate::{PayArcError, Result};
use ethereum_types::{Address, H256, U256};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info, warn};

/// JSON-RPC client bound to one endpoint
#[derive(Debug)]
pub struct JsonRpcClient {
    /// RPC endpoint URL
    rpc_url: String,
    /// HTTP client for RPC calls
    client: reqwest::Client,
    /// Request id counter
    next_id: AtomicU64,
}

/// Call object for `eth_call` and `eth_estimateGas`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

/// Error object of a JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

/// JSON-RPC response envelope
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl JsonRpcClient {
    /// Create a new client with the default request timeout
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self::with_timeout(rpc_url, Duration::from_secs(30))
    }

    /// Create a new client with a custom request timeout
    pub fn with_timeout(rpc_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            rpc_url: rpc_url.into(),
            client,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.rpc_url
    }

    /// Issue a raw JSON-RPC request and return its `result`, which is
    /// `Value::Null` when the node sent none
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(method, id, "rpc request");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "method": method,
                "params": params,
                "id": id
            }))
            .send()
            .await
            .map_err(|e| PayArcError::network_error(format!("RPC request failed: {}", e)))?;

        let response: RpcResponse = response.json().await.map_err(|e| {
            PayArcError::network_error(format!("Failed to parse RPC response: {}", e))
        })?;

        if let Some(error) = response.error {
            warn!(method, code = error.code, message = %error.message, "rpc error");
            return Err(PayArcError::Rpc {
                code: error.code,
                message: error.message,
                data: error.data,
            });
        }

        Ok(response.result)
    }

    async fn request_str(&self, method: &str, params: Value) -> Result<String> {
        let result = self.request(method, params).await?;
        result.as_str().map(str::to_string).ok_or_else(|| {
            PayArcError::network_error(format!("Expected string result for {}", method))
        })
    }

    /// Chain id reported by the node
    pub async fn chain_id(&self) -> Result<u64> {
        parse_quantity_u64(&self.request_str("eth_chainId", json!([])).await?)
    }

    /// Latest block number
    pub async fn block_number(&self) -> Result<u64> {
        parse_quantity_u64(&self.request_str("eth_blockNumber", json!([])).await?)
    }

    /// Current legacy gas price
    pub async fn gas_price(&self) -> Result<U256> {
        parse_quantity(&self.request_str("eth_gasPrice", json!([])).await?)
    }

    /// Native balance of an address
    pub async fn get_balance(&self, address: Address) -> Result<U256> {
        parse_quantity(
            &self
                .request_str("eth_getBalance", json!([address, "latest"]))
                .await?,
        )
    }

    /// Next nonce for an address, counting pending transactions
    pub async fn get_transaction_count(&self, address: Address) -> Result<u64> {
        parse_quantity_u64(
            &self
                .request_str("eth_getTransactionCount", json!([address, "pending"]))
                .await?,
        )
    }

    /// Estimate gas for a call
    pub async fn estimate_gas(&self, call: &CallRequest) -> Result<u64> {
        let gas = self
            .request_str("eth_estimateGas", json!([call]))
            .await
            .map_err(revert_from_rpc)?;
        parse_quantity_u64(&gas)
    }

    /// Execute a read-only call against the latest block
    pub async fn call(&self, call: &CallRequest) -> Result<Vec<u8>> {
        let output = self
            .request_str("eth_call", json!([call, "latest"]))
            .await
            .map_err(revert_from_rpc)?;
        hex::decode(output.trim_start_matches("0x"))
            .map_err(|_| PayArcError::abi_decode("eth_call returned invalid hex"))
    }

    /// Broadcast a signed transaction
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<H256> {
        let hash = self
            .request_str(
                "eth_sendRawTransaction",
                json!([format!("0x{}", hex::encode(raw))]),
            )
            .await?;
        parse_hash(&hash)
    }

    /// Receipt for a transaction, `None` while it is not yet mined
    pub async fn get_transaction_receipt(&self, hash: H256) -> Result<Option<TransactionReceipt>> {
        let result = self
            .request("eth_getTransactionReceipt", json!([hash]))
            .await?;
        if result.is_null() {
            return Ok(None);
        }

        let block_number = match result.get("blockNumber").and_then(|v| v.as_str()) {
            Some(block) => parse_quantity_u64(block)?,
            None => return Ok(None),
        };

        let status = match result.get("status").and_then(|v| v.as_str()) {
            Some(status) if parse_quantity(status)?.is_zero() => TransactionStatus::Failed,
            _ => TransactionStatus::Success,
        };

        let quantity = |key: &str| {
            result
                .get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| parse_quantity(s).ok())
        };
        let address = |key: &str| {
            result
                .get(key)
                .and_then(|v| v.as_str())
                .and_then(|s| abi::parse_address(s).ok())
        };

        Ok(Some(TransactionReceipt {
            transaction_hash: hash,
            block_number,
            status,
            gas_used: quantity("gasUsed"),
            effective_gas_price: quantity("effectiveGasPrice"),
            from: address("from"),
            to: address("to"),
        }))
    }

    /// Poll until the transaction is mined.
    ///
    /// A mined but reverted transaction yields `TransactionFailed`.
    pub async fn wait_for_receipt(
        &self,
        hash: H256,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TransactionReceipt> {
        let poll = async {
            loop {
                if let Some(receipt) = self.get_transaction_receipt(hash).await? {
                    return Ok::<_, PayArcError>(receipt);
                }
                debug!(tx = ?hash, "receipt not available yet");
                tokio::time::sleep(poll_interval).await;
            }
        };

        let receipt = tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| PayArcError::ConfirmationTimeout {
                hash: format!("{:?}", hash),
            })??;

        if !receipt.succeeded() {
            warn!(tx = ?hash, block = receipt.block_number, "transaction reverted");
            return Err(PayArcError::TransactionFailed {
                hash: format!("{:?}", hash),
            });
        }

        info!(tx = ?hash, block = receipt.block_number, "transaction confirmed");
        Ok(receipt)
    }

    /// Get network information
    pub async fn network_info(&self) -> Result<NetworkInfo> {
        Ok(NetworkInfo {
            chain_id: self.chain_id().await?,
            latest_block: self.block_number().await?,
            gas_price: self.gas_price().await?,
        })
    }
}

/// Turn an RPC error carrying revert data into `ContractReverted`
fn revert_from_rpc(error: PayArcError) -> PayArcError {
    match error {
        PayArcError::Rpc {
            code,
            message,
            data,
        } => {
            let revert_data = data.as_ref().and_then(revert_bytes);
            match revert_data {
                Some(bytes) => PayArcError::ContractReverted {
                    reason: abi::decode_revert_reason(&bytes),
                },
                None if message.contains("revert") => PayArcError::ContractReverted {
                    reason: message,
                },
                None => PayArcError::Rpc {
                    code,
                    message,
                    data,
                },
            }
        }
        other => other,
    }
}

/// Revert bytes from the `data` member, which nodes send either as a hex
/// string or as an object with its own `data` field
fn revert_bytes(data: &Value) -> Option<Vec<u8>> {
    let text = match data {
        Value::String(s) => s.as_str(),
        Value::Object(map) => map.get("data")?.as_str()?,
        _ => return None,
    };
    hex::decode(text.trim_start_matches("0x")).ok()
}

/// Serde helper for `0x` prefixed byte strings
mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        hex::decode(text.trim_start_matches("0x")).map_err(serde::de::Error::custom)
    }
}
