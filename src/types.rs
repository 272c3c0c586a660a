//! Core types for the invoice registry client

use crate::abi::{self, InvoiceTuple};
use crate::{PayArcError, Result};
use chrono::{DateTime, TimeZone, Utc};
use ethereum_types::{Address, H256, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default token: USDC on Arc
pub const DEFAULT_TOKEN_ADDRESS: &str = "0x3600000000000000000000000000000000000000";

/// Decimals assumed for the payment token when none can be resolved
pub const DEFAULT_TOKEN_DECIMALS: u8 = 6;

/// Payment state of an invoice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Pending,
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "Pending"),
            InvoiceStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// An invoice as stored by the registry contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    pub id: String,
    /// Amount in token base units
    pub amount: U256,
    pub issuer: Address,
    pub paid: bool,
    pub payer: Address,
    /// Unix timestamp of payment, zero while pending
    pub paid_at: U256,
}

impl Invoice {
    /// Build from decoded `getInvoice` output.
    ///
    /// The registry returns an all-zero record for unknown ids, which is
    /// reported as `InvoiceNotFound`.
    pub fn from_tuple(id: impl Into<String>, tuple: InvoiceTuple) -> Result<Self> {
        let id = id.into();
        if tuple.issuer.is_zero() {
            return Err(PayArcError::InvoiceNotFound { id });
        }
        Ok(Self {
            id,
            amount: tuple.amount,
            issuer: tuple.issuer,
            paid: tuple.paid,
            payer: tuple.payer,
            paid_at: tuple.paid_at,
        })
    }

    pub fn status(&self) -> InvoiceStatus {
        if self.paid {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::Pending
        }
    }

    /// Payment time, only when paid
    pub fn paid_at_datetime(&self) -> Option<DateTime<Utc>> {
        if !self.paid || self.paid_at > U256::from(i64::MAX as u64) {
            return None;
        }
        Utc.timestamp_opt(self.paid_at.low_u64() as i64, 0).single()
    }

    /// Presentation form with the amount scaled by `decimals`
    pub fn view(&self, decimals: u8) -> InvoiceView {
        InvoiceView {
            id: self.id.clone(),
            amount: format_units(self.amount, decimals),
            issuer: abi::to_checksum(&self.issuer),
            status: self.status(),
            payer: self.paid.then(|| abi::to_checksum(&self.payer)),
            paid_at: self.paid_at_datetime(),
        }
    }
}

/// Human readable invoice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceView {
    pub id: String,
    pub amount: String,
    pub issuer: String,
    pub status: InvoiceStatus,
    pub payer: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl fmt::Display for InvoiceView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Invoice: {}", self.id)?;
        writeln!(f, "Amount: {}", self.amount)?;
        writeln!(f, "Issuer: {}", self.issuer)?;
        writeln!(f, "Status: {}", self.status)?;
        writeln!(f, "Payer: {}", self.payer.as_deref().unwrap_or("-"))?;
        match &self.paid_at {
            Some(at) => write!(f, "Payment Date: {}", at.format("%Y-%m-%d %H:%M:%S UTC")),
            None => write!(f, "Payment Date: -"),
        }
    }
}

/// Mined transaction status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionStatus {
    Success,
    Failed,
}

/// Receipt of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub transaction_hash: H256,
    pub block_number: u64,
    pub status: TransactionStatus,
    pub gas_used: Option<U256>,
    pub effective_gas_price: Option<U256>,
    pub from: Option<Address>,
    pub to: Option<Address>,
}

impl TransactionReceipt {
    pub fn succeeded(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}

/// Network information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub latest_block: u64,
    pub gas_price: U256,
}

/// Parse a decimal token amount such as `"12.5"` into base units
pub fn parse_units(text: &str, decimals: u8) -> Result<U256> {
    let trimmed = text.trim();
    let value = Decimal::from_str(trimmed)
        .map_err(|e| PayArcError::invalid_amount(format!("'{}': {}", trimmed, e)))?
        .normalize();

    if value.is_sign_negative() && !value.is_zero() {
        return Err(PayArcError::invalid_amount(format!(
            "'{}' is negative",
            trimmed
        )));
    }
    let scale = value.scale();
    if scale > decimals as u32 {
        return Err(PayArcError::invalid_amount(format!(
            "'{}' has more than {} decimal places",
            trimmed, decimals
        )));
    }

    if value.is_zero() {
        return Ok(U256::zero());
    }

    let too_large = || PayArcError::invalid_amount(format!("'{}' is too large", trimmed));
    let mantissa = value.mantissa().unsigned_abs();
    let factor = U256::from(10u8)
        .checked_pow(U256::from(decimals as u32 - scale))
        .ok_or_else(too_large)?;
    U256::from(mantissa).checked_mul(factor).ok_or_else(too_large)
}

/// Format base units as a decimal string, keeping at least one fractional digit
pub fn format_units(value: U256, decimals: u8) -> String {
    let digits = value.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        format!("{}.0", whole)
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Parse a JSON-RPC hex quantity
pub fn parse_quantity(text: &str) -> Result<U256> {
    let digits = text.trim_start_matches("0x");
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_str_radix(digits, 16)
        .map_err(|_| PayArcError::network_error(format!("invalid hex quantity '{}'", text)))
}

/// Parse a JSON-RPC hex quantity that must fit in 64 bits
pub fn parse_quantity_u64(text: &str) -> Result<u64> {
    u64::from_str_radix(text.trim_start_matches("0x"), 16)
        .map_err(|_| PayArcError::network_error(format!("invalid hex quantity '{}'", text)))
}

/// Parse a 32 byte hex hash
pub fn parse_hash(text: &str) -> Result<H256> {
    let bytes = hex::decode(text.trim_start_matches("0x"))
        .map_err(|_| PayArcError::network_error(format!("invalid hash '{}'", text)))?;
    if bytes.len() != 32 {
        return Err(PayArcError::network_error(format!("invalid hash '{}'", text)));
    }
    Ok(H256::from_slice(&bytes))
}
