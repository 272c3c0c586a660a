//! Transaction construction, signing and submission

use crate::abi::keccak256;
use crate::rpc::{CallRequest, JsonRpcClient};
use crate::types::TransactionReceipt;
use crate::wallet::Wallet;
use crate::{PayArcError, Result};
use ethereum_types::{Address, H256, U256};
use rlp::RlpStream;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Pre-EIP-1559 transaction signed with EIP-155 replay protection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: U256,
    pub gas_limit: u64,
    pub to: Address,
    pub value: U256,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

/// EIP-155 signature values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionSignature {
    pub v: u64,
    pub r: U256,
    pub s: U256,
}

/// Signed transaction ready for broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub raw: Vec<u8>,
    pub hash: H256,
}

impl LegacyTransaction {
    fn append_fields(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to);
        stream.append(&self.value);
        stream.append(&self.data);
    }

    /// RLP payload that gets hashed for signing
    pub fn signing_payload(&self) -> Vec<u8> {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        stream.out().to_vec()
    }

    pub fn signing_hash(&self) -> H256 {
        H256::from(keccak256(&self.signing_payload()))
    }

    /// Attach a signature and produce the broadcast encoding
    pub fn sign_with(&self, signature: TransactionSignature) -> SignedTransaction {
        let mut stream = RlpStream::new_list(9);
        self.append_fields(&mut stream);
        stream.append(&signature.v);
        stream.append(&signature.r);
        stream.append(&signature.s);

        let raw = stream.out().to_vec();
        let hash = H256::from(keccak256(&raw));
        SignedTransaction { raw, hash }
    }
}

/// Gas and confirmation settings applied to every write
#[derive(Debug, Clone, PartialEq)]
pub struct TxSettings {
    /// How long to wait for a receipt
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls
    pub poll_interval: Duration,
    /// Factor applied to `eth_estimateGas`
    pub gas_multiplier: f64,
    /// Fixed gas limit, skips estimation when set
    pub gas_limit: Option<u64>,
}

impl Default for TxSettings {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
            gas_multiplier: 1.2,
            gas_limit: None,
        }
    }
}

impl TxSettings {
    fn scale_gas(&self, estimate: u64) -> u64 {
        let scaled = (estimate as f64 * self.gas_multiplier).ceil();
        if scaled.is_finite() && scaled >= estimate as f64 {
            scaled as u64
        } else {
            estimate
        }
    }
}

/// A connected wallet able to send transactions through one node
#[derive(Debug)]
pub struct TransactionSender {
    rpc: Arc<JsonRpcClient>,
    wallet: Wallet,
    chain_id: u64,
    settings: TxSettings,
}

impl TransactionSender {
    /// Bind a wallet to the node, checking the node's chain id against
    /// `expected_chain_id` when one is configured
    pub async fn connect(
        rpc: Arc<JsonRpcClient>,
        wallet: Wallet,
        expected_chain_id: Option<u64>,
        settings: TxSettings,
    ) -> Result<Self> {
        let chain_id = rpc.chain_id().await?;
        if let Some(expected) = expected_chain_id {
            if expected != chain_id {
                return Err(PayArcError::ChainMismatch {
                    expected,
                    actual: chain_id,
                });
            }
        }

        info!(address = ?wallet.address(), chain_id, "wallet connected");
        Ok(Self {
            rpc,
            wallet,
            chain_id,
            settings,
        })
    }

    pub fn address(&self) -> Address {
        self.wallet.address()
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn settings(&self) -> &TxSettings {
        &self.settings
    }

    /// Build, sign and broadcast a call to `to`, returning the transaction hash
    pub async fn send(&self, to: Address, data: Vec<u8>) -> Result<H256> {
        let from = self.wallet.address();
        let gas_limit = match self.settings.gas_limit {
            Some(limit) => limit,
            None => {
                let call = CallRequest {
                    from: Some(from),
                    to,
                    data: data.clone(),
                };
                let estimate = self.rpc.estimate_gas(&call).await?;
                debug!(estimate, "gas estimated");
                self.settings.scale_gas(estimate)
            }
        };

        let nonce = self.rpc.get_transaction_count(from).await?;
        let gas_price = self.rpc.gas_price().await?;

        let tx = LegacyTransaction {
            nonce,
            gas_price,
            gas_limit,
            to,
            value: U256::zero(),
            data,
            chain_id: self.chain_id,
        };
        let signed = self.wallet.sign_transaction(&tx)?;

        let hash = self.rpc.send_raw_transaction(&signed.raw).await?;
        if hash != signed.hash {
            warn!(node = ?hash, local = ?signed.hash, "node reported a different transaction hash");
        }

        info!(tx = ?hash, nonce, gas_limit, "transaction submitted");
        Ok(hash)
    }

    /// Send and wait until the transaction is mined successfully
    pub async fn send_and_confirm(&self, to: Address, data: Vec<u8>) -> Result<TransactionReceipt> {
        let hash = self.send(to, data).await?;
        self.rpc
            .wait_for_receipt(
                hash,
                self.settings.confirmation_timeout,
                self.settings.poll_interval,
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::parse_address;
    use crate::wallet::WalletFactory;

    fn eip155_example() -> LegacyTransaction {
        LegacyTransaction {
            nonce: 9,
            gas_price: U256::from(20_000_000_000u64),
            gas_limit: 21_000,
            to: parse_address("0x3535353535353535353535353535353535353535").unwrap(),
            value: U256::from(1_000_000_000_000_000_000u64),
            data: Vec::new(),
            chain_id: 1,
        }
    }

    #[test]
    fn test_eip155_signing_payload() {
        let tx = eip155_example();
        assert_eq!(
            hex::encode(tx.signing_payload()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            format!("{:?}", tx.signing_hash()),
            "0xdaf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn test_eip155_signed_transaction() {
        let wallet = WalletFactory::from_private_key(
            "0x4646464646464646464646464646464646464646464646464646464646464646",
        )
        .unwrap();

        let signed = wallet.sign_transaction(&eip155_example()).unwrap();
        assert_eq!(
            hex::encode(&signed.raw),
            "f86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(signed.hash, H256::from(keccak256(&signed.raw)));
    }

    #[test]
    fn test_gas_scaling() {
        let settings = TxSettings::default();
        assert_eq!(settings.scale_gas(100_000), 120_000);

        let flat = TxSettings {
            gas_multiplier: 1.0,
            ..TxSettings::default()
        };
        assert_eq!(flat.scale_gas(21_000), 21_000);

        let broken = TxSettings {
            gas_multiplier: f64::NAN,
            ..TxSettings::default()
        };
        assert_eq!(broken.scale_gas(21_000), 21_000);
    }
}
