//! Approve-then-pay flow for settling an invoice in ERC-20 tokens

use crate::contract::{Erc20Token, InvoiceRegistry};
use crate::transaction::TransactionSender;
use crate::types::{Invoice, TransactionReceipt};
use crate::{PayArcError, Result};
use ethereum_types::U256;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// How much allowance to grant when the current one is too small
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApprovalPolicy {
    /// Approve exactly the invoice amount
    #[default]
    Exact,
    /// Approve the maximum amount so later payments skip approval
    Unlimited,
}

impl ApprovalPolicy {
    fn amount_for(self, required: U256) -> U256 {
        match self {
            ApprovalPolicy::Exact => required,
            ApprovalPolicy::Unlimited => U256::MAX,
        }
    }
}

/// Result of a completed payment
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Approval receipt, absent when the allowance already sufficed
    pub approval: Option<TransactionReceipt>,
    pub payment: TransactionReceipt,
    /// Invoice as re-read after payment
    pub invoice: Invoice,
}

/// Pay invoice `id` from the sender's account.
///
/// Reads the invoice and the payer's balance first, then:
/// 1. reads the current allowance granted to the registry
/// 2. approves the registry if the allowance is insufficient
/// 3. waits for the approval to be mined
/// 4. calls `payInvoice`
/// 5. waits for the payment to be mined
/// 6. re-reads the invoice
pub async fn pay_invoice(
    registry: &InvoiceRegistry,
    token: &Erc20Token,
    sender: &TransactionSender,
    id: &str,
    policy: ApprovalPolicy,
) -> Result<PaymentOutcome> {
    let invoice = registry.get_invoice(id).await?;
    if invoice.paid {
        return Err(PayArcError::InvoiceAlreadyPaid { id: id.to_string() });
    }

    let payer = sender.address();
    let balance = token.balance_of(payer).await?;
    if balance < invoice.amount {
        return Err(PayArcError::InsufficientFunds {
            required: invoice.amount.to_string(),
            available: balance.to_string(),
        });
    }

    let allowance = token.allowance(payer, registry.address()).await?;
    debug!(%allowance, required = %invoice.amount, "current allowance");

    let approval = if allowance < invoice.amount {
        let amount = policy.amount_for(invoice.amount);
        Some(token.approve(sender, registry.address(), amount).await?)
    } else {
        None
    };

    let payment = registry.pay_invoice(sender, id).await?;
    let invoice = registry.get_invoice(id).await?;
    info!(id, paid = invoice.paid, "invoice payment confirmed");

    Ok(PaymentOutcome {
        approval,
        payment,
        invoice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_amounts() {
        let required = U256::from(2_000_000u64);
        assert_eq!(ApprovalPolicy::Exact.amount_for(required), required);
        assert_eq!(ApprovalPolicy::Unlimited.amount_for(required), U256::MAX);
        assert_eq!(ApprovalPolicy::default(), ApprovalPolicy::Exact);
    }
}
