//! # payarc - invoice registry client
//!
//! A Rust client for the PayArc on-chain invoice registry. It reads the
//! registry owner, creates and queries invoices, pays them in USDC through
//! the ERC-20 approve-then-pay flow and withdraws collected funds, all over
//! plain JSON-RPC with a local signing key.

pub mod abi;
pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod payment;
pub mod rpc;
pub mod session;
pub mod transaction;
pub mod types;
pub mod wallet;

// Re-exports for convenience
pub use config::{Config, ConfigBuilder};
pub use contract::{Erc20Token, InvoiceRegistry};
pub use error::{PayArcError, Result};
pub use payment::{ApprovalPolicy, PaymentOutcome};
pub use rpc::JsonRpcClient;
pub use session::{Session, WithdrawOutcome};
pub use types::*;
pub use wallet::{Wallet, WalletFactory};

/// Current version of the payarc library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
