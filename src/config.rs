//! Client configuration
//!
//! Values come from defaults, an optional JSON file, `PAYARC_*` environment
//! variables and command-line flags, in increasing order of precedence. The
//! last two are merged by the CLI layer; this module owns the defaults, the
//! file format and validation.

use crate::abi::parse_address;
use crate::transaction::TxSettings;
use crate::types::DEFAULT_TOKEN_ADDRESS;
use crate::{PayArcError, Result};
use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Validated client configuration
#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    pub contract_address: Address,
    pub token_address: Address,
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
    /// Token decimals; resolved on-chain when absent
    pub token_decimals: Option<u8>,
    pub tx: TxSettings,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("token_address", &self.token_address)
            .field("chain_id", &self.chain_id)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("token_decimals", &self.token_decimals)
            .field("tx", &self.tx)
            .finish()
    }
}

/// On-disk configuration; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigFile {
    pub rpc_url: Option<String>,
    pub contract_address: Option<String>,
    pub token_address: Option<String>,
    pub chain_id: Option<u64>,
    pub private_key: Option<String>,
    pub token_decimals: Option<u8>,
    pub confirmation_timeout_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub gas_multiplier: Option<f64>,
    pub gas_limit: Option<u64>,
}

impl ConfigFile {
    /// Read a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        serde_json::from_str(&text).map_err(|e| {
            PayArcError::config(format!(
                "Invalid config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }
}

/// Configuration builder
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    file: ConfigFile,
}

impl ConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the values of a config file
    pub fn from_file(file: ConfigFile) -> Self {
        Self { file }
    }

    /// Set the RPC URL
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.file.rpc_url = Some(url.into());
        self
    }

    /// Set the invoice registry address
    pub fn contract_address(mut self, address: impl Into<String>) -> Self {
        self.file.contract_address = Some(address.into());
        self
    }

    /// Set the payment token address
    pub fn token_address(mut self, address: impl Into<String>) -> Self {
        self.file.token_address = Some(address.into());
        self
    }

    /// Require the node to report this chain id
    pub fn chain_id(mut self, chain_id: u64) -> Self {
        self.file.chain_id = Some(chain_id);
        self
    }

    /// Set the signing key
    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.file.private_key = Some(key.into());
        self
    }

    /// Fix the token decimals instead of reading them from the token
    pub fn token_decimals(mut self, decimals: u8) -> Self {
        self.file.token_decimals = Some(decimals);
        self
    }

    /// Set the confirmation timeout
    pub fn confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.file.confirmation_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Set the receipt poll interval
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.file.poll_interval_ms = Some(interval.as_millis() as u64);
        self
    }

    /// Set the gas estimate multiplier
    pub fn gas_multiplier(mut self, multiplier: f64) -> Self {
        self.file.gas_multiplier = Some(multiplier);
        self
    }

    /// Use a fixed gas limit
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.file.gas_limit = Some(limit);
        self
    }

    /// Validate and build the configuration
    pub fn build(self) -> Result<Config> {
        let file = self.file;

        let rpc_url = file
            .rpc_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| PayArcError::config("RPC URL is not set (PAYARC_RPC_URL)"))?;
        let parsed = url::Url::parse(&rpc_url)
            .map_err(|e| PayArcError::config(format!("Invalid RPC URL '{}': {}", rpc_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PayArcError::config(format!(
                "RPC URL must be http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let contract = file
            .contract_address
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| {
                PayArcError::config("Contract address is not set (PAYARC_CONTRACT)")
            })?;
        let contract_address = parse_address(&contract)
            .map_err(|_| PayArcError::config(format!("Invalid contract address '{}'", contract)))?;

        let token = file
            .token_address
            .unwrap_or_else(|| DEFAULT_TOKEN_ADDRESS.to_string());
        let token_address = parse_address(&token)
            .map_err(|_| PayArcError::config(format!("Invalid token address '{}'", token)))?;

        let defaults = TxSettings::default();
        let gas_multiplier = file.gas_multiplier.unwrap_or(defaults.gas_multiplier);
        if !gas_multiplier.is_finite() || gas_multiplier < 1.0 {
            return Err(PayArcError::config(format!(
                "Gas multiplier must be at least 1.0, got {}",
                gas_multiplier
            )));
        }
        if file.confirmation_timeout_ms == Some(0) {
            return Err(PayArcError::config("Confirmation timeout must be positive"));
        }
        if file.poll_interval_ms == Some(0) {
            return Err(PayArcError::config("Poll interval must be positive"));
        }

        Ok(Config {
            rpc_url,
            contract_address,
            token_address,
            chain_id: file.chain_id,
            private_key: file.private_key.filter(|k| !k.trim().is_empty()),
            token_decimals: file.token_decimals,
            tx: TxSettings {
                confirmation_timeout: file
                    .confirmation_timeout_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.confirmation_timeout),
                poll_interval: file
                    .poll_interval_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                gas_multiplier,
                gas_limit: file.gas_limit,
            },
        })
    }
}
