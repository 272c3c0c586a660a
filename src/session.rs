//! Client session state
//!
//! A `Session` is the whole client-side state of the invoice client: which
//! wallet is connected, who owns the registry, the last invoice looked at and
//! whether an operation is in flight. Everything else lives in the contract.

use crate::config::Config;
use crate::contract::{Erc20Token, InvoiceRegistry};
use crate::payment::{self, ApprovalPolicy, PaymentOutcome};
use crate::rpc::JsonRpcClient;
use crate::transaction::TransactionSender;
use crate::types::{
    parse_units, InvoiceView, NetworkInfo, TransactionReceipt, DEFAULT_TOKEN_DECIMALS,
};
use crate::wallet::{Wallet, WalletFactory};
use crate::{abi, PayArcError, Result};
use ethereum_types::{Address, U256};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

#[derive(Debug, Default)]
struct SessionState {
    owner: Option<Address>,
    last_invoice: Option<InvoiceView>,
    token_decimals: Option<u8>,
}

/// Resets the busy flag when an operation ends
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Result of a withdrawal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// Registry token balance read just before the withdraw transaction
    pub amount: U256,
    pub receipt: TransactionReceipt,
}

/// Invoice client session
#[derive(Debug)]
pub struct Session {
    config: Config,
    rpc: Arc<JsonRpcClient>,
    registry: InvoiceRegistry,
    token: Erc20Token,
    sender: RwLock<Option<Arc<TransactionSender>>>,
    state: Mutex<SessionState>,
    busy: AtomicBool,
}

impl Session {
    pub fn new(config: Config) -> Self {
        let rpc = Arc::new(JsonRpcClient::new(config.rpc_url.clone()));
        let registry = InvoiceRegistry::new(config.contract_address, rpc.clone());
        let token = Erc20Token::new(config.token_address, rpc.clone());

        Self {
            state: Mutex::new(SessionState {
                token_decimals: config.token_decimals,
                ..SessionState::default()
            }),
            config,
            rpc,
            registry,
            token,
            sender: RwLock::new(None),
            busy: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &InvoiceRegistry {
        &self.registry
    }

    pub fn token(&self) -> &Erc20Token {
        &self.token
    }

    /// Whether an operation is currently in flight
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn begin(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PayArcError::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    /// Read the registry owner and cache it
    pub async fn load_owner(&self) -> Result<Address> {
        let owner = self.registry.owner().await?;
        self.state.lock().await.owner = Some(owner);
        info!(owner = %abi::to_checksum(&owner), "registry owner loaded");
        Ok(owner)
    }

    /// Cached owner, if it has been loaded
    pub async fn owner(&self) -> Option<Address> {
        self.state.lock().await.owner
    }

    /// Connect a wallet, replacing any previously connected one
    pub async fn connect(&self, wallet: Wallet) -> Result<Address> {
        let sender = TransactionSender::connect(
            self.rpc.clone(),
            wallet,
            self.config.chain_id,
            self.config.tx.clone(),
        )
        .await?;
        let address = sender.address();
        *self.sender.write().await = Some(Arc::new(sender));
        Ok(address)
    }

    /// Connect the wallet whose key is in the configuration
    pub async fn connect_configured(&self) -> Result<Address> {
        let key = self
            .config
            .private_key
            .as_deref()
            .ok_or_else(|| PayArcError::config("No private key configured (PAYARC_PRIVATE_KEY)"))?;
        self.connect(WalletFactory::from_private_key(key)?).await
    }

    pub async fn connected_address(&self) -> Option<Address> {
        self.sender.read().await.as_ref().map(|s| s.address())
    }

    async fn signer(&self) -> Result<Arc<TransactionSender>> {
        self.sender
            .read()
            .await
            .clone()
            .ok_or(PayArcError::WalletNotConnected)
    }

    /// Whether the connected wallet owns the registry
    pub async fn is_owner(&self) -> bool {
        let connected = self.connected_address().await;
        let owner = self.owner().await;
        matches!((connected, owner), (Some(c), Some(o)) if c == o)
    }

    /// Decimals of the payment token, read once from the token contract
    pub async fn token_decimals(&self) -> u8 {
        if let Some(decimals) = self.state.lock().await.token_decimals {
            return decimals;
        }

        let decimals = match self.token.decimals().await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!(error = %e, "could not read token decimals, assuming {}", DEFAULT_TOKEN_DECIMALS);
                DEFAULT_TOKEN_DECIMALS
            }
        };
        self.state.lock().await.token_decimals = Some(decimals);
        decimals
    }

    /// Look up an invoice and remember it as the last queried one
    pub async fn query_invoice(&self, id: &str) -> Result<InvoiceView> {
        validate_invoice_id(id)?;
        let _guard = self.begin()?;

        let invoice = self.registry.get_invoice(id).await?;
        let view = invoice.view(self.token_decimals().await);
        self.state.lock().await.last_invoice = Some(view.clone());
        Ok(view)
    }

    pub async fn last_invoice(&self) -> Option<InvoiceView> {
        self.state.lock().await.last_invoice.clone()
    }

    /// Create an invoice for a decimal token amount such as `"12.5"`
    pub async fn create_invoice(&self, id: &str, amount: &str) -> Result<TransactionReceipt> {
        validate_invoice_id(id)?;
        let sender = self.signer().await?;
        let _guard = self.begin()?;

        let amount = parse_units(amount, self.token_decimals().await)?;
        if amount.is_zero() {
            return Err(PayArcError::invalid_amount("amount must be greater than zero"));
        }

        match self.registry.get_invoice(id).await {
            Ok(_) => return Err(PayArcError::InvoiceAlreadyExists { id: id.to_string() }),
            Err(PayArcError::InvoiceNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        self.registry.create_invoice(&sender, id, amount).await
    }

    /// Pay an invoice from the connected wallet
    pub async fn pay_invoice(&self, id: &str, policy: ApprovalPolicy) -> Result<PaymentOutcome> {
        validate_invoice_id(id)?;
        let sender = self.signer().await?;
        let _guard = self.begin()?;

        let outcome =
            payment::pay_invoice(&self.registry, &self.token, &sender, id, policy).await?;
        let view = outcome.invoice.view(self.token_decimals().await);
        self.state.lock().await.last_invoice = Some(view);
        Ok(outcome)
    }

    /// Withdraw collected funds; only the registry owner may do this
    pub async fn withdraw(&self) -> Result<WithdrawOutcome> {
        let sender = self.signer().await?;
        let _guard = self.begin()?;

        let owner = match self.owner().await {
            Some(owner) => owner,
            None => self.load_owner().await?,
        };
        if owner != sender.address() {
            return Err(PayArcError::NotOwner {
                owner: abi::to_checksum(&owner),
                connected: abi::to_checksum(&sender.address()),
            });
        }

        let amount = self.token.balance_of(self.registry.address()).await?;
        let receipt = self.registry.withdraw(&sender).await?;
        info!(amount = %amount, "funds withdrawn");
        Ok(WithdrawOutcome { amount, receipt })
    }

    /// Token balance of an address
    pub async fn token_balance(&self, address: Address) -> Result<U256> {
        self.token.balance_of(address).await
    }

    /// Native currency balance of an address
    pub async fn native_balance(&self, address: Address) -> Result<U256> {
        self.rpc.get_balance(address).await
    }

    pub async fn network_info(&self) -> Result<NetworkInfo> {
        self.rpc.network_info().await
    }
}

fn validate_invoice_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(PayArcError::invalid_invoice_id("invoice id must not be empty"));
    }
    Ok(())
}
