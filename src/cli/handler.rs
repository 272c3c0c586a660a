//! Subcommand execution

use super::{Output, OutputFormat, PayArcCommand};
use crate::abi::{parse_address, to_checksum};
use crate::payment::ApprovalPolicy;
use crate::session::Session;
use crate::types::{format_units, TransactionReceipt};
use crate::Result;
use serde_json::json;

/// Decimals of the chain's native currency
const NATIVE_DECIMALS: u8 = 18;

fn receipt_json(receipt: &TransactionReceipt) -> serde_json::Value {
    json!({
        "transactionHash": format!("{:?}", receipt.transaction_hash),
        "blockNumber": receipt.block_number,
        "gasUsed": receipt.gas_used.map(|g| g.to_string()),
    })
}

fn receipt_line(receipt: &TransactionReceipt) -> String {
    format!(
        "tx {:?} in block {}",
        receipt.transaction_hash, receipt.block_number
    )
}

/// Execute one subcommand against a session
pub async fn handle_command(
    command: &PayArcCommand,
    format: OutputFormat,
    session: &Session,
    output: &dyn Output,
) -> Result<()> {
    match command {
        PayArcCommand::Owner => {
            let owner = to_checksum(&session.load_owner().await?);
            match format {
                OutputFormat::Json => output.print_json(&json!({ "owner": owner })),
                OutputFormat::Text => output.print(&format!("Owner: {}", owner)),
            }
        }

        PayArcCommand::Connect => {
            let address = session.connect_configured().await?;
            session.load_owner().await?;
            let is_owner = session.is_owner().await;
            let address = to_checksum(&address);
            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "address": address,
                    "isOwner": is_owner,
                })),
                OutputFormat::Text => {
                    output.success(&format!("Connected: {}", address))?;
                    if is_owner {
                        output.info("This wallet owns the invoice registry")?;
                    }
                    Ok(())
                }
            }
        }

        PayArcCommand::Create { id, amount } => {
            session.connect_configured().await?;
            let receipt = session.create_invoice(id, amount).await?;
            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "invoice": id,
                    "receipt": receipt_json(&receipt),
                })),
                OutputFormat::Text => output.success(&format!(
                    "Invoice {} created ({})",
                    id,
                    receipt_line(&receipt)
                )),
            }
        }

        PayArcCommand::Query { id } => {
            let view = session.query_invoice(id).await?;
            match format {
                OutputFormat::Json => output.print_json(&serde_json::to_value(&view)?),
                OutputFormat::Text => output.print(&view.to_string()),
            }
        }

        PayArcCommand::Pay {
            id,
            unlimited_approval,
        } => {
            session.connect_configured().await?;
            let policy = if *unlimited_approval {
                ApprovalPolicy::Unlimited
            } else {
                ApprovalPolicy::Exact
            };
            let outcome = session.pay_invoice(id, policy).await?;
            let view = outcome.invoice.view(session.token_decimals().await);

            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "approval": outcome.approval.as_ref().map(receipt_json),
                    "payment": receipt_json(&outcome.payment),
                    "invoice": serde_json::to_value(&view)?,
                })),
                OutputFormat::Text => {
                    if let Some(approval) = &outcome.approval {
                        output.success(&format!("Approved ({})", receipt_line(approval)))?;
                    }
                    output.success(&format!(
                        "Invoice {} paid ({})",
                        id,
                        receipt_line(&outcome.payment)
                    ))?;
                    output.print(&view.to_string())
                }
            }
        }

        PayArcCommand::Withdraw => {
            session.connect_configured().await?;
            let outcome = session.withdraw().await?;
            let receipt = outcome.receipt;
            let amount = format_units(outcome.amount, session.token_decimals().await);

            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "withdrawn": amount,
                    "receipt": receipt_json(&receipt),
                })),
                OutputFormat::Text => output.success(&format!(
                    "Withdrew {} ({})",
                    amount,
                    receipt_line(&receipt)
                )),
            }
        }

        PayArcCommand::Balance { address } => {
            let address = match address {
                Some(text) => parse_address(text)?,
                None => session.connect_configured().await?,
            };
            let decimals = session.token_decimals().await;
            let token = format_units(session.token_balance(address).await?, decimals);
            let native = format_units(session.native_balance(address).await?, NATIVE_DECIMALS);
            let address = to_checksum(&address);

            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "address": address,
                    "token": token,
                    "native": native,
                })),
                OutputFormat::Text => output.print(&format!(
                    "Address: {}\nToken: {}\nNative: {}",
                    address, token, native
                )),
            }
        }

        PayArcCommand::Network => {
            let info = session.network_info().await?;
            match format {
                OutputFormat::Json => output.print_json(&json!({
                    "chainId": info.chain_id,
                    "latestBlock": info.latest_block,
                    "gasPrice": info.gas_price.to_string(),
                })),
                OutputFormat::Text => output.print(&format!(
                    "Chain ID: {}\nLatest block: {}\nGas price: {} wei",
                    info.chain_id, info.latest_block, info.gas_price
                )),
            }
        }
    }
}
