//! Local key wallet
//!
//! This module provides the signer behind "connect wallet": a secp256k1 key
//! held in memory that derives its address and signs EIP-155 transactions.

use crate::abi::keccak256;
use crate::transaction::{LegacyTransaction, SignedTransaction, TransactionSignature};
use crate::{PayArcError, Result};
use ethereum_types::{Address, H256, U256};
use k256::ecdsa::{RecoveryId, Signature as K256Signature, VerifyingKey};
use secp256k1::{Message, PublicKey, SecretKey, SECP256K1};
use std::fmt;

/// Wallet holding a private key in memory
pub struct Wallet {
    secret_key: SecretKey,
    address: Address,
}

impl Wallet {
    /// Create a wallet from a secret key
    pub fn new(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(SECP256K1, &secret_key);
        let uncompressed = public_key.serialize_uncompressed();
        let hash = keccak256(&uncompressed[1..]);

        Self {
            secret_key,
            address: Address::from_slice(&hash[12..]),
        }
    }

    /// Address controlled by this wallet
    pub fn address(&self) -> Address {
        self.address
    }

    /// Sign a 32 byte digest, returning the recovery id and compact `r || s`
    pub fn sign_hash(&self, hash: H256) -> Result<(u8, [u8; 64])> {
        let message = Message::from_digest_slice(hash.as_bytes())
            .map_err(|_| PayArcError::wallet("Invalid message hash"))?;

        let signature = SECP256K1.sign_ecdsa_recoverable(&message, &self.secret_key);
        let (recovery_id, compact) = signature.serialize_compact();

        Ok((recovery_id.to_i32() as u8, compact))
    }

    /// Sign a legacy transaction with EIP-155 replay protection.
    ///
    /// The signature is checked to recover to this wallet's address before
    /// the encoded transaction is returned.
    pub fn sign_transaction(&self, tx: &LegacyTransaction) -> Result<SignedTransaction> {
        let hash = tx.signing_hash();
        let (recovery_id, compact) = self.sign_hash(hash)?;

        let recovered = recover_address(hash, recovery_id, &compact)?;
        if recovered != self.address {
            return Err(PayArcError::wallet(
                "Generated signature does not recover to the wallet address",
            ));
        }

        let signature = TransactionSignature {
            v: recovery_id as u64 + tx.chain_id * 2 + 35,
            r: U256::from_big_endian(&compact[..32]),
            s: U256::from_big_endian(&compact[32..]),
        };
        Ok(tx.sign_with(signature))
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .finish_non_exhaustive()
    }
}

/// Recover the signer address of a digest
pub fn recover_address(hash: H256, recovery_id: u8, compact: &[u8; 64]) -> Result<Address> {
    let signature = K256Signature::from_slice(compact)
        .map_err(|_| PayArcError::wallet("Invalid signature format"))?;
    let recovery_id = RecoveryId::from_byte(recovery_id)
        .ok_or_else(|| PayArcError::wallet("Invalid recovery ID"))?;

    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
        .map_err(|_| PayArcError::wallet("Failed to recover public key"))?;

    let point = verifying_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Ok(Address::from_slice(&hash[12..]))
}

/// Wallet factory for creating wallets from different sources
pub struct WalletFactory;

impl WalletFactory {
    /// Create wallet from a `0x`-prefixed hex private key
    pub fn from_private_key(private_key: &str) -> Result<Wallet> {
        let digits = private_key
            .trim()
            .strip_prefix("0x")
            .filter(|d| d.len() == 64)
            .ok_or_else(|| {
                PayArcError::wallet(
                    "Invalid private key format. Must be 0x followed by 64 hex characters",
                )
            })?;

        let bytes =
            hex::decode(digits).map_err(|_| PayArcError::wallet("Invalid hex in private key"))?;
        let secret_key = SecretKey::from_slice(&bytes)
            .map_err(|_| PayArcError::wallet("Private key is not a valid secp256k1 scalar"))?;

        Ok(Wallet::new(secret_key))
    }

    /// Create wallet from environment variable
    pub fn from_env(private_key_env: &str) -> Result<Wallet> {
        let private_key = std::env::var(private_key_env).map_err(|_| {
            PayArcError::config(format!(
                "Environment variable {} not found",
                private_key_env
            ))
        })?;

        Self::from_private_key(&private_key)
    }
}
