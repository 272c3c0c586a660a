//! PayArc command-line interface
//!
//! Parses arguments, merges them over the optional config file, sets up
//! logging and hands the chosen subcommand to the handler.

pub mod handler;
pub mod output;

use crate::config::{Config, ConfigBuilder, ConfigFile};
use crate::session::Session;
use crate::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::Level;

pub use handler::handle_command;
pub use output::{CapturedOutput, ConsoleOutput, Output};

/// PayArc invoice registry client
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(name = "payarc")]
pub struct PayArcCli {
    /// JSON-RPC endpoint of the chain
    #[arg(long, env = "PAYARC_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Invoice registry contract address
    #[arg(long, env = "PAYARC_CONTRACT")]
    pub contract: Option<String>,

    /// Payment token address (defaults to USDC)
    #[arg(long, env = "PAYARC_TOKEN")]
    pub token: Option<String>,

    /// Refuse to sign unless the node reports this chain id
    #[arg(long, env = "PAYARC_CHAIN_ID")]
    pub chain_id: Option<u64>,

    /// Private key of the wallet to connect
    #[arg(long, env = "PAYARC_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// Token decimals, read from the token when omitted
    #[arg(long, env = "PAYARC_DECIMALS")]
    pub decimals: Option<u8>,

    /// Seconds to wait for a transaction to be mined
    #[arg(long, env = "PAYARC_CONFIRM_TIMEOUT")]
    pub confirm_timeout: Option<u64>,

    /// Milliseconds between receipt polls
    #[arg(long, env = "PAYARC_POLL_INTERVAL")]
    pub poll_interval: Option<u64>,

    /// Factor applied to the node's gas estimate
    #[arg(long, env = "PAYARC_GAS_MULTIPLIER")]
    pub gas_multiplier: Option<f64>,

    /// Fixed gas limit instead of estimating
    #[arg(long, env = "PAYARC_GAS_LIMIT")]
    pub gas_limit: Option<u64>,

    /// JSON configuration file
    #[arg(short, long, env = "PAYARC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, env = "PAYARC_FORMAT")]
    pub format: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: PayArcCommand,
}

/// Output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// PayArc commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PayArcCommand {
    /// Show the registry owner
    Owner,

    /// Connect the configured wallet and show its address
    Connect,

    /// Create an invoice
    Create {
        /// Invoice identifier
        id: String,
        /// Amount in token units, e.g. 12.5
        amount: String,
    },

    /// Show an invoice
    Query {
        /// Invoice identifier
        id: String,
    },

    /// Pay an invoice, approving the registry first if needed
    Pay {
        /// Invoice identifier
        id: String,
        /// Approve the maximum amount instead of the invoice amount
        #[arg(long)]
        unlimited_approval: bool,
    },

    /// Withdraw collected funds (owner only)
    Withdraw,

    /// Show token and native balances
    Balance {
        /// Address to inspect, defaults to the connected wallet
        address: Option<String>,
    },

    /// Show chain id, latest block and gas price
    Network,
}

/// Merge the config file with flags and environment values
pub fn build_config(cli: &PayArcCli) -> Result<Config> {
    let file = match &cli.config {
        Some(path) => ConfigFile::load(path)?,
        None => ConfigFile::default(),
    };

    let mut builder = ConfigBuilder::from_file(file);
    if let Some(url) = &cli.rpc_url {
        builder = builder.rpc_url(url);
    }
    if let Some(contract) = &cli.contract {
        builder = builder.contract_address(contract);
    }
    if let Some(token) = &cli.token {
        builder = builder.token_address(token);
    }
    if let Some(chain_id) = cli.chain_id {
        builder = builder.chain_id(chain_id);
    }
    if let Some(key) = &cli.private_key {
        builder = builder.private_key(key);
    }
    if let Some(decimals) = cli.decimals {
        builder = builder.token_decimals(decimals);
    }
    if let Some(secs) = cli.confirm_timeout {
        builder = builder.confirmation_timeout(Duration::from_secs(secs));
    }
    if let Some(ms) = cli.poll_interval {
        builder = builder.poll_interval(Duration::from_millis(ms));
    }
    if let Some(multiplier) = cli.gas_multiplier {
        builder = builder.gas_multiplier(multiplier);
    }
    if let Some(limit) = cli.gas_limit {
        builder = builder.gas_limit(limit);
    }
    builder.build()
}

/// Install the stderr log subscriber
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // Already installed when embedded in another program
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Run a parsed command line against the given output
pub async fn run(cli: &PayArcCli, output: &dyn Output) -> Result<()> {
    let config = build_config(cli)?;
    let session = Session::new(config);
    handle_command(&cli.command, cli.format, &session, output).await
}

/// Binary entry point
pub async fn run_cli() -> ExitCode {
    let cli = PayArcCli::parse();
    init_tracing(cli.verbose);

    let output = ConsoleOutput;
    match run(&cli, &output).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = output.error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
