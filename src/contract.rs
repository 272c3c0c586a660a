//! Typed handles for the invoice registry and its payment token

use crate::abi::{self, encode_call, signatures, Decoder, Token};
use crate::rpc::{CallRequest, JsonRpcClient};
use crate::transaction::TransactionSender;
use crate::types::{Invoice, TransactionReceipt};
use crate::Result;
use ethereum_types::{Address, U256};
use std::sync::Arc;
use tracing::info;

/// Handle to the invoice registry contract
#[derive(Debug, Clone)]
pub struct InvoiceRegistry {
    address: Address,
    rpc: Arc<JsonRpcClient>,
}

impl InvoiceRegistry {
    pub fn new(address: Address, rpc: Arc<JsonRpcClient>) -> Self {
        Self { address, rpc }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.rpc
            .call(&CallRequest {
                from: None,
                to: self.address,
                data,
            })
            .await
    }

    /// `owner()`
    pub async fn owner(&self) -> Result<Address> {
        let output = self.read(encode_call(signatures::OWNER, &[])).await?;
        Decoder::new(&output).address(0)
    }

    /// `getInvoice(id)`, failing with `InvoiceNotFound` for unknown ids
    pub async fn get_invoice(&self, id: &str) -> Result<Invoice> {
        let output = self
            .read(encode_call(
                signatures::GET_INVOICE,
                &[Token::String(id.to_string())],
            ))
            .await?;
        Invoice::from_tuple(id, abi::decode_invoice(&output)?)
    }

    /// `createInvoice(id, amount)`
    pub async fn create_invoice(
        &self,
        sender: &TransactionSender,
        id: &str,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        info!(id, %amount, "creating invoice");
        let data = encode_call(
            signatures::CREATE_INVOICE,
            &[Token::String(id.to_string()), Token::Uint(amount)],
        );
        sender.send_and_confirm(self.address, data).await
    }

    /// `payInvoice(id)`; the token allowance must already cover the amount
    pub async fn pay_invoice(&self, sender: &TransactionSender, id: &str) -> Result<TransactionReceipt> {
        info!(id, "paying invoice");
        let data = encode_call(signatures::PAY_INVOICE, &[Token::String(id.to_string())]);
        sender.send_and_confirm(self.address, data).await
    }

    /// `withdraw()`
    pub async fn withdraw(&self, sender: &TransactionSender) -> Result<TransactionReceipt> {
        info!("withdrawing collected funds");
        sender
            .send_and_confirm(self.address, encode_call(signatures::WITHDRAW, &[]))
            .await
    }
}

/// Handle to an ERC-20 token
#[derive(Debug, Clone)]
pub struct Erc20Token {
    address: Address,
    rpc: Arc<JsonRpcClient>,
}

impl Erc20Token {
    pub fn new(address: Address, rpc: Arc<JsonRpcClient>) -> Self {
        Self { address, rpc }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        self.rpc
            .call(&CallRequest {
                from: None,
                to: self.address,
                data,
            })
            .await
    }

    pub async fn balance_of(&self, owner: Address) -> Result<U256> {
        let output = self
            .read(encode_call(signatures::BALANCE_OF, &[Token::Address(owner)]))
            .await?;
        Decoder::new(&output).uint(0)
    }

    pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256> {
        let output = self
            .read(encode_call(
                signatures::ALLOWANCE,
                &[Token::Address(owner), Token::Address(spender)],
            ))
            .await?;
        Decoder::new(&output).uint(0)
    }

    pub async fn decimals(&self) -> Result<u8> {
        let output = self.read(encode_call(signatures::DECIMALS, &[])).await?;
        Decoder::new(&output).uint8(0)
    }

    /// `approve(spender, amount)` and wait for it to be mined
    pub async fn approve(
        &self,
        sender: &TransactionSender,
        spender: Address,
        amount: U256,
    ) -> Result<TransactionReceipt> {
        info!(spender = ?spender, %amount, "approving token allowance");
        let data = encode_call(
            signatures::APPROVE,
            &[Token::Address(spender), Token::Uint(amount)],
        );
        sender.send_and_confirm(self.address, data).await
    }
}
