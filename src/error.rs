//! Error types for the payarc library

use thiserror::Error;

/// Result type alias for payarc operations
pub type Result<T> = std::result::Result<T, PayArcError>;

/// Main error type for payarc operations
#[derive(Error, Debug)]
pub enum PayArcError {
    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport level failure talking to the RPC endpoint
    #[error("Network error: {message}")]
    Network { message: String },

    /// Error object returned by the JSON-RPC endpoint
    #[error("RPC error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// A contract call reverted
    #[error("Contract reverted: {reason}")]
    ContractReverted { reason: String },

    /// Return data could not be decoded
    #[error("ABI decoding failed: {message}")]
    AbiDecode { message: String },

    /// Malformed address
    #[error("Invalid address: {address}")]
    InvalidAddress { address: String },

    /// Malformed or out of range token amount
    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    /// Empty or otherwise unusable invoice identifier
    #[error("Invalid invoice id: {message}")]
    InvalidInvoiceId { message: String },

    /// Invoice does not exist in the registry
    #[error("Invoice not found: {id}")]
    InvoiceNotFound { id: String },

    /// Invoice id is already taken
    #[error("Invoice already exists: {id}")]
    InvoiceAlreadyExists { id: String },

    /// Invoice has already been settled
    #[error("Invoice already paid: {id}")]
    InvoiceAlreadyPaid { id: String },

    /// Payer balance is below the invoice amount
    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: String, available: String },

    /// Owner-only operation attempted by another account
    #[error("Only the contract owner {owner} may do this (connected: {connected})")]
    NotOwner { owner: String, connected: String },

    /// Operation needs a signer but no wallet is connected
    #[error("Wallet not connected")]
    WalletNotConnected,

    /// Another operation is still in flight
    #[error("Another operation is in progress")]
    Busy,

    /// Node reports a different chain than configured
    #[error("Chain id mismatch: expected {expected}, node reports {actual}")]
    ChainMismatch { expected: u64, actual: u64 },

    /// Invalid private key or signing failure
    #[error("Wallet error: {message}")]
    Wallet { message: String },

    /// Transaction was mined but reverted
    #[error("Transaction failed: {hash}")]
    TransactionFailed { hash: String },

    /// Receipt did not appear before the deadline
    #[error("Timed out waiting for confirmation of {hash}")]
    ConfirmationTimeout { hash: String },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PayArcError {
    /// Create a network error
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an ABI decoding error
    pub fn abi_decode(message: impl Into<String>) -> Self {
        Self::AbiDecode {
            message: message.into(),
        }
    }

    /// Create an invalid address error
    pub fn invalid_address(address: impl Into<String>) -> Self {
        Self::InvalidAddress {
            address: address.into(),
        }
    }

    /// Create an invalid amount error
    pub fn invalid_amount(message: impl Into<String>) -> Self {
        Self::InvalidAmount {
            message: message.into(),
        }
    }

    /// Create an invalid invoice id error
    pub fn invalid_invoice_id(message: impl Into<String>) -> Self {
        Self::InvalidInvoiceId {
            message: message.into(),
        }
    }

    /// Create a wallet error
    pub fn wallet(message: impl Into<String>) -> Self {
        Self::Wallet {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether the error came from the contract rejecting the call
    pub fn is_revert(&self) -> bool {
        matches!(
            self,
            Self::ContractReverted { .. } | Self::TransactionFailed { .. }
        )
    }
}
