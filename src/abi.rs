//! Solidity ABI encoding for the invoice registry and ERC-20 interfaces
//!
//! Only the handful of types those interfaces use are supported: `address`,
//! `uint256`, `uint8`, `bool` and `string`.

use crate::{PayArcError, Result};
use ethereum_types::{Address, U256};

/// Function signatures of the contracts this client talks to
pub mod signatures {
    pub const OWNER: &str = "owner()";
    pub const CREATE_INVOICE: &str = "createInvoice(string,uint256)";
    pub const GET_INVOICE: &str = "getInvoice(string)";
    pub const PAY_INVOICE: &str = "payInvoice(string)";
    pub const WITHDRAW: &str = "withdraw()";

    pub const BALANCE_OF: &str = "balanceOf(address)";
    pub const APPROVE: &str = "approve(address,uint256)";
    pub const ALLOWANCE: &str = "allowance(address,address)";
    pub const DECIMALS: &str = "decimals()";

    pub const ERROR: &str = "Error(string)";
    pub const PANIC: &str = "Panic(uint256)";
}

/// ABI word size in bytes
const WORD: usize = 32;

/// A single ABI encodable argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    String(String),
}

/// Keccak-256 hash function
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    Keccak256::digest(data).into()
}

/// First four bytes of the keccak hash of a function signature
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Encode a function call: selector followed by the encoded arguments
pub fn encode_call(signature: &str, tokens: &[Token]) -> Vec<u8> {
    let mut out = selector(signature).to_vec();
    out.extend(encode_tokens(tokens));
    out
}

/// Encode arguments using the head/tail layout
pub fn encode_tokens(tokens: &[Token]) -> Vec<u8> {
    let head_len = WORD * tokens.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for token in tokens {
        match token {
            Token::Address(address) => head.extend_from_slice(&address_word(address)),
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::String(text) => {
                let offset = (head_len + tail.len()) as u64;
                head.extend_from_slice(&uint_word(U256::from(offset)));
                tail.extend_from_slice(&uint_word(U256::from(text.len() as u64)));
                tail.extend_from_slice(text.as_bytes());
                let padding = (WORD - text.len() % WORD) % WORD;
                tail.resize(tail.len() + padding, 0);
            }
        }
    }

    head.extend(tail);
    head
}

fn uint_word(value: U256) -> [u8; 32] {
    let mut word = [0u8; 32];
    value.to_big_endian(&mut word);
    word
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_bytes());
    word
}

/// Reader over ABI encoded return data
#[derive(Debug, Clone, Copy)]
pub struct Decoder<'a> {
    data: &'a [u8],
}

impl<'a> Decoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Raw 32-byte word at the given index
    pub fn word(&self, index: usize) -> Result<&'a [u8]> {
        let start = index * WORD;
        self.data.get(start..start + WORD).ok_or_else(|| {
            PayArcError::abi_decode(format!(
                "return data too short: need word {} of {} bytes",
                index,
                self.data.len()
            ))
        })
    }

    pub fn uint(&self, index: usize) -> Result<U256> {
        Ok(U256::from_big_endian(self.word(index)?))
    }

    pub fn address(&self, index: usize) -> Result<Address> {
        let word = self.word(index)?;
        if word[..12].iter().any(|b| *b != 0) {
            return Err(PayArcError::abi_decode("address word has dirty high bytes"));
        }
        Ok(Address::from_slice(&word[12..]))
    }

    pub fn bool(&self, index: usize) -> Result<bool> {
        let value = self.uint(index)?;
        if value.is_zero() {
            Ok(false)
        } else if value == U256::one() {
            Ok(true)
        } else {
            Err(PayArcError::abi_decode(format!("invalid bool value {}", value)))
        }
    }

    pub fn uint8(&self, index: usize) -> Result<u8> {
        let value = self.uint(index)?;
        if value > U256::from(u8::MAX) {
            return Err(PayArcError::abi_decode(format!("uint8 out of range: {}", value)));
        }
        Ok(value.low_u32() as u8)
    }

    /// Dynamic string whose offset is stored in the given head word
    pub fn string(&self, index: usize) -> Result<String> {
        let offset = self.offset(index)?;
        let length_word = self
            .data
            .get(offset..offset + WORD)
            .ok_or_else(|| PayArcError::abi_decode("string length out of bounds"))?;
        let length = U256::from_big_endian(length_word);
        if length > U256::from(self.data.len() as u64) {
            return Err(PayArcError::abi_decode("string length exceeds data"));
        }
        let start = offset + WORD;
        let bytes = self
            .data
            .get(start..start + length.low_u64() as usize)
            .ok_or_else(|| PayArcError::abi_decode("string body out of bounds"))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|_| PayArcError::abi_decode("string is not valid UTF-8"))
    }

    fn offset(&self, index: usize) -> Result<usize> {
        let offset = self.uint(index)?;
        if offset > U256::from(self.data.len() as u64) {
            return Err(PayArcError::abi_decode("offset out of bounds"));
        }
        Ok(offset.low_u64() as usize)
    }
}

/// Return values of `getInvoice(string)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTuple {
    pub amount: U256,
    pub issuer: Address,
    pub paid: bool,
    pub payer: Address,
    pub paid_at: U256,
}

/// Decode the `(uint256,address,bool,address,uint256)` invoice tuple
pub fn decode_invoice(data: &[u8]) -> Result<InvoiceTuple> {
    let decoder = Decoder::new(data);
    Ok(InvoiceTuple {
        amount: decoder.uint(0)?,
        issuer: decoder.address(1)?,
        paid: decoder.bool(2)?,
        payer: decoder.address(3)?,
        paid_at: decoder.uint(4)?,
    })
}

/// Render revert data as a human readable reason
pub fn decode_revert_reason(data: &[u8]) -> String {
    if data.is_empty() {
        return "execution reverted".to_string();
    }
    if data.len() < 4 {
        return format!("malformed revert data 0x{}", hex::encode(data));
    }

    let (sel, body) = data.split_at(4);
    if sel == selector(signatures::ERROR) {
        if let Ok(reason) = Decoder::new(body).string(0) {
            return reason;
        }
    } else if sel == selector(signatures::PANIC) {
        if let Ok(code) = Decoder::new(body).uint(0) {
            return format!("panic code 0x{:x}", code);
        }
    }
    format!("custom error 0x{}", hex::encode(data))
}

/// Parse a `0x`-prefixed 20 byte hex address, any letter case
pub fn parse_address(text: &str) -> Result<Address> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| PayArcError::invalid_address(trimmed))?;
    if digits.len() != 40 {
        return Err(PayArcError::invalid_address(trimmed));
    }
    let bytes = hex::decode(digits).map_err(|_| PayArcError::invalid_address(trimmed))?;
    Ok(Address::from_slice(&bytes))
}

/// EIP-55 mixed-case checksum representation
pub fn to_checksum(address: &Address) -> String {
    let lower = hex::encode(address.as_bytes());
    let hash = keccak256(lower.as_bytes());

    let mut out = String::with_capacity(42);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = (hash[i / 2] >> (if i % 2 == 0 { 4 } else { 0 })) & 0x0f;
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}
