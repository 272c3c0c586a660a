//! Shared JSON-RPC mocking helpers

#![allow(dead_code)]

use ethereum_types::{Address, U256};
use mockito::{Matcher, Mock, Server, ServerGuard};
use payarc::abi::{encode_tokens, selector, signatures, Token};
use payarc::{Config, ConfigBuilder, Session};
use serde_json::{json, Value};
use std::time::Duration;

/// Hardhat account #0
pub const PAYER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const PAYER_ADDRESS: &str = "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266";

pub const CONTRACT: &str = "0x209693Bc6afc0C5328bA36FaF03C514EF312287C";
pub const ISSUER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";
pub const TX_HASH: &str = "0xabababababababababababababababababababababababababababababababab";

/// Arc testnet chain id, 5042002
pub const CHAIN_ID_HEX: &str = "0x4cef52";

pub fn address(text: &str) -> Address {
    payarc::abi::parse_address(text).unwrap()
}

pub fn hex_selector(signature: &str) -> String {
    hex::encode(selector(signature))
}

pub fn rpc_result(result: Value) -> String {
    json!({ "jsonrpc": "2.0", "id": 1, "result": result }).to_string()
}

pub fn encoded(tokens: &[Token]) -> Value {
    Value::String(format!("0x{}", hex::encode(encode_tokens(tokens))))
}

pub fn invoice_output(amount: u64, issuer: Address, paid: bool, payer: Address) -> Value {
    encoded(&[
        Token::Uint(U256::from(amount)),
        Token::Address(issuer),
        Token::Uint(if paid { U256::one() } else { U256::zero() }),
        Token::Address(payer),
        Token::Uint(if paid { U256::from(1_700_000_000u64) } else { U256::zero() }),
    ])
}

pub fn missing_invoice_output() -> Value {
    invoice_output(0, Address::zero(), false, Address::zero())
}

pub fn uint_output(value: U256) -> Value {
    encoded(&[Token::Uint(value)])
}

pub fn address_output(value: Address) -> Value {
    encoded(&[Token::Address(value)])
}

pub async fn rpc_server() -> ServerGuard {
    Server::new_async().await
}

/// Config whose token decimals are read from the token contract
pub fn unpinned_config(server: &ServerGuard) -> ConfigBuilder {
    ConfigBuilder::new()
        .rpc_url(server.url())
        .contract_address(CONTRACT)
        .private_key(PAYER_KEY)
        .poll_interval(Duration::from_millis(10))
        .confirmation_timeout(Duration::from_secs(5))
}

pub fn config(server: &ServerGuard) -> ConfigBuilder {
    unpinned_config(server).token_decimals(6)
}

pub fn session(config: Config) -> Session {
    Session::new(config)
}

/// Mock every request for one RPC method
pub async fn mock_method(server: &mut ServerGuard, method: &str, result: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(result))
        .create_async()
        .await
}

/// Mock `eth_call` for one function selector
pub async fn mock_call(server: &mut ServerGuard, signature: &str, output: Value) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_call" })),
            Matcher::Regex(format!("\"data\":\"0x{}", hex_selector(signature))),
        ]))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(output))
        .create_async()
        .await
}

/// Mock `eth_sendRawTransaction` for transactions calling `signature`
pub async fn mock_send(server: &mut ServerGuard, signature: &str, hits: usize) -> Mock {
    mock_send_matching(server, hex_selector(signature), hits).await
}

/// Mock `eth_sendRawTransaction` for raw transactions matching `pattern`
pub async fn mock_send_matching(server: &mut ServerGuard, pattern: String, hits: usize) -> Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::AllOf(vec![
            Matcher::PartialJson(json!({ "method": "eth_sendRawTransaction" })),
            Matcher::Regex(pattern),
        ]))
        .with_header("content-type", "application/json")
        .with_body(rpc_result(json!(TX_HASH)))
        .expect(hits)
        .create_async()
        .await
}

/// Hex calldata of `approve(spender, amount)`
pub fn approve_calldata(spender: Address, amount: U256) -> String {
    let mut data = selector(signatures::APPROVE).to_vec();
    data.extend(encode_tokens(&[Token::Address(spender), Token::Uint(amount)]));
    hex::encode(data)
}

/// Mock what a write needs before the broadcast
pub async fn mock_sign_plumbing(server: &mut ServerGuard) -> Vec<Mock> {
    vec![
        mock_method(server, "eth_chainId", json!(CHAIN_ID_HEX)).await,
        mock_method(server, "eth_estimateGas", json!("0x186a0")).await,
        mock_method(server, "eth_getTransactionCount", json!("0x3")).await,
        mock_method(server, "eth_gasPrice", json!("0x3b9aca00")).await,
    ]
}

/// Mock everything a write needs apart from the broadcast itself
pub async fn mock_write_plumbing(server: &mut ServerGuard, status: &str) -> Vec<Mock> {
    let mut mocks = mock_sign_plumbing(server).await;
    mocks.push(
        mock_method(
            server,
            "eth_getTransactionReceipt",
            json!({
                "transactionHash": TX_HASH,
                "blockNumber": "0x10",
                "status": status,
                "gasUsed": "0x5208",
                "effectiveGasPrice": "0x3b9aca00",
                "from": PAYER_ADDRESS,
                "to": CONTRACT
            }),
        )
        .await,
    );
    mocks
}
