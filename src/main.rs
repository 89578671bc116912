//! Custody Agent CLI Application
//!
//! A command-line interface over the custody agent and a JSON-RPC node.

use clap::{Parser, Subcommand};
use custody_agent::agent::CustodyAgent;
use custody_agent::cli;
use custody_agent::config::AgentConfig;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "custody")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Short-lived custody of Ethereum wallet keys", long_about = None)]
struct Cli {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keystore directory
    #[arg(short, long)]
    keystore: Option<PathBuf>,

    /// Ethereum JSON-RPC endpoint
    #[arg(long)]
    rpc_url: Option<String>,

    /// Chain ID used for signing
    #[arg(long)]
    chain_id: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Account operations
    Account {
        #[command(subcommand)]
        action: AccountCommands,
    },

    /// Show the pending balance of an address
    Balance {
        /// Account address
        #[arg(short, long)]
        address: String,
    },

    /// Show the next nonce of an address
    Nonce {
        /// Account address
        #[arg(short, long)]
        address: String,
    },

    /// Show the node's suggested gas price
    GasPrice,

    /// Sign a transfer and optionally broadcast it
    Send {
        /// Sender's address
        #[arg(short, long)]
        from: String,

        /// Sender's keystore passphrase
        #[arg(short, long, env = "CUSTODY_PASSPHRASE", hide_env_values = true)]
        passphrase: String,

        /// Recipient's address
        #[arg(short, long)]
        to: String,

        /// Amount in ETH
        #[arg(short, long)]
        amount: f64,

        /// Gas limit
        #[arg(long)]
        gas_limit: Option<u64>,

        /// Gas price in gwei (defaults to the node's suggestion)
        #[arg(long)]
        gas_price: Option<f64>,

        /// Submit the signed transaction
        #[arg(long)]
        broadcast: bool,
    },
}

#[derive(Subcommand)]
enum AccountCommands {
    /// Create a new account
    New {
        /// Passphrase sealing the new key
        #[arg(short, long, env = "CUSTODY_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },

    /// List all accounts
    List,

    /// Import a hex private key
    ImportKey {
        /// Private key (hex, optional 0x)
        #[arg(short, long)]
        key: String,
    },

    /// Import an encrypted keyfile
    ImportFile {
        /// Keyfile path
        #[arg(short, long)]
        file: PathBuf,

        /// Keyfile passphrase
        #[arg(short, long, env = "CUSTODY_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },

    /// Print an account's private key
    Export {
        /// Account address
        #[arg(short, long)]
        address: String,

        /// Keystore passphrase
        #[arg(short, long, env = "CUSTODY_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },

    /// Show the keyfile path of an account
    Keyfile {
        /// Account address
        #[arg(short, long)]
        address: String,

        /// Keystore passphrase
        #[arg(short, long, env = "CUSTODY_PASSPHRASE", hide_env_values = true)]
        passphrase: String,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AgentConfig::load(path)?,
        None => AgentConfig::default(),
    }
    .with_env()?;
    if let Some(dir) = cli.keystore {
        config.keystore_dir = dir;
    }
    if let Some(url) = cli.rpc_url {
        config.rpc_url = url;
    }
    if let Some(chain_id) = cli.chain_id {
        config.chain_id = chain_id;
    }

    let agent = Arc::new(CustodyAgent::open(config)?);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let _reaper = agent.spawn_reaper();

        // reqwest's blocking client must stay off the async workers
        let command = cli.command;
        let worker = agent.clone();
        let outcome = tokio::task::spawn_blocking(move || {
            run_command(&worker, command).map_err(|e| e.to_string())
        })
        .await?;
        outcome?;

        Ok::<(), Box<dyn std::error::Error>>(())
    })
}

fn run_command(agent: &CustodyAgent, command: Commands) -> cli::CliResult<()> {
    match command {
        Commands::Account { action } => match action {
            AccountCommands::New { passphrase } => {
                cli::cmd_account_new(agent, &passphrase)?;
            }
            AccountCommands::List => {
                cli::cmd_account_list(agent)?;
            }
            AccountCommands::ImportKey { key } => {
                cli::cmd_account_import_key(agent, &key)?;
            }
            AccountCommands::ImportFile { file, passphrase } => {
                cli::cmd_account_import_file(agent, &file, &passphrase)?;
            }
            AccountCommands::Export {
                address,
                passphrase,
            } => {
                cli::cmd_account_export(agent, &address, &passphrase)?;
            }
            AccountCommands::Keyfile {
                address,
                passphrase,
            } => {
                cli::cmd_account_keyfile(agent, &address, &passphrase)?;
            }
        },
        Commands::Balance { address } => {
            cli::cmd_balance(agent, &address)?;
        }
        Commands::Nonce { address } => {
            cli::cmd_nonce(agent, &address)?;
        }
        Commands::GasPrice => {
            cli::cmd_gas_price(agent)?;
        }
        Commands::Send {
            from,
            passphrase,
            to,
            amount,
            gas_limit,
            gas_price,
            broadcast,
        } => {
            cli::cmd_send(
                agent, &from, &passphrase, &to, amount, gas_limit, gas_price, broadcast,
            )?;
        }
    }

    Ok(())
}
