//! CLI commands for the custody agent
//!
//! Each handler is synchronous and talks to the agent directly; `main` runs
//! them on tokio's blocking pool while the reaper ticks on the runtime.

use crate::agent::CustodyAgent;
use crate::core::{Address, DEFAULT_GAS_LIMIT};
use crate::session::Permission;
use std::fs;
use std::path::Path;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn parse_address(text: &str) -> CliResult<Address> {
    Ok(text.parse::<Address>()?)
}

/// Create a new account
pub fn cmd_account_new(agent: &CustodyAgent, passphrase: &str) -> CliResult<()> {
    let account = agent.create_address(passphrase)?;

    println!("🔐 New account created!");
    println!("   📍 Address: {}", account.address);
    println!("   📁 Keyfile: {:?}", account.path);
    println!("\n   ⚠️  IMPORTANT: Without the passphrase this key cannot be unlocked.");
    println!("   Keys left idle past their unlock window are deleted from the keystore.");

    Ok(())
}

/// List keystore entries
pub fn cmd_account_list(agent: &CustodyAgent) -> CliResult<()> {
    let entries = agent.keystore().list()?;

    if entries.is_empty() {
        println!("📭 No accounts found. Create one with: custody account new");
        return Ok(());
    }

    println!("📋 Accounts:");
    for entry in &entries {
        let address = entry
            .file_name
            .rsplit("--")
            .next()
            .unwrap_or(entry.file_name.as_str());
        println!("   0x{} ({})", address, entry.file_name);
    }

    Ok(())
}

/// Import a hex private key
pub fn cmd_account_import_key(agent: &CustodyAgent, private_key: &str) -> CliResult<()> {
    let account = agent.import_raw_key(private_key)?;

    println!("✅ Key imported!");
    println!("   📍 Address: {}", account.address);
    println!("   ⚠️  Raw keys are stored with an empty passphrase.");

    Ok(())
}

/// Import an encrypted keyfile
pub fn cmd_account_import_file(agent: &CustodyAgent, file: &Path, passphrase: &str) -> CliResult<()> {
    let keyfile = fs::read(file)?;
    let account = agent.import_keyfile(&keyfile, passphrase)?;

    println!("✅ Keyfile imported!");
    println!("   📍 Address: {}", account.address);
    println!("   📁 Keyfile: {:?}", account.path);

    Ok(())
}

/// Print the raw private key of an account
pub fn cmd_account_export(agent: &CustodyAgent, address: &str, passphrase: &str) -> CliResult<()> {
    let account = agent.unlock(&parse_address(address)?, passphrase)?;
    let private_key = agent.export_private_key(&account)?;

    println!("🔑 Private key for {}", account.address);
    println!("   0x{}", private_key.as_str());
    println!("\n   ⚠️  Anyone holding this key controls the account.");

    Ok(())
}

/// Show where an account's keyfile lives
pub fn cmd_account_keyfile(agent: &CustodyAgent, address: &str, passphrase: &str) -> CliResult<()> {
    let account = agent.unlock(&parse_address(address)?, passphrase)?;
    let token = agent.issue_token(&account, Permission::Download, agent.download_token_ttl());
    let path = agent.keyfile_path(&token)?;

    println!("📁 Keyfile for {}", account.address);
    println!("   {}", path.display());

    Ok(())
}

/// Pending balance of an address
pub fn cmd_balance(agent: &CustodyAgent, address: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    let balance = agent.balance(&address)?;

    println!("💰 Balance for {}", address);
    println!("   Total: {} ETH", balance);

    Ok(())
}

/// Next nonce of an address
pub fn cmd_nonce(agent: &CustodyAgent, address: &str) -> CliResult<()> {
    let address = parse_address(address)?;
    let nonce = agent.nonce(&address)?;

    println!("🔢 Next nonce for {}: {}", address, nonce);

    Ok(())
}

/// Node's suggested gas price
pub fn cmd_gas_price(agent: &CustodyAgent) -> CliResult<()> {
    let gas_price = agent.estimate_gas()?;

    println!("⛽ Suggested gas price: {} gwei", gas_price);

    Ok(())
}

/// Sign a transfer, queue it, and optionally broadcast it
#[allow(clippy::too_many_arguments)]
pub fn cmd_send(
    agent: &CustodyAgent,
    from: &str,
    passphrase: &str,
    to: &str,
    amount: f64,
    gas_limit: Option<u64>,
    gas_price: Option<f64>,
    broadcast: bool,
) -> CliResult<()> {
    let to = parse_address(to)?;
    let account = agent.unlock(&parse_address(from)?, passphrase)?;

    let token = agent.issue_token(&account, Permission::Send, agent.send_token_ttl());
    let nonce = agent.nonce(&account.address)?;
    let gas_price = match gas_price {
        Some(price) => price,
        None => agent.estimate_gas()?,
    };
    let gas_limit = gas_limit.unwrap_or(DEFAULT_GAS_LIMIT);

    let tx = agent.build_transaction(nonce, &to, amount, gas_limit, gas_price, &token)?;
    let tx_id = agent.sign_and_queue(&tx, &token)?;
    let signed = agent.pending_transaction(&tx_id)?;

    println!("✍️  Transaction signed!");
    println!("   ├─ From: {}", account.address);
    println!("   ├─ To: {}", to);
    println!("   ├─ Amount: {} ETH", amount);
    println!("   ├─ Nonce: {}", nonce);
    println!("   ├─ Gas: {} @ {} gwei", gas_limit, gas_price);
    println!("   ├─ Chain ID: {}", signed.chain_id);
    println!("   └─ Hash: {}", signed.hash_hex());

    if !broadcast {
        println!("\n   Raw transaction:");
        println!("   {}", signed.raw_hex());
        println!("\n   Not broadcast. Re-run with --broadcast to submit it.");
        return Ok(());
    }

    let hash = agent.broadcast(&tx_id)?;
    println!("\n📡 Broadcast to {}", agent.config().rpc_url);
    println!("   Transaction hash: {}", hash);

    Ok(())
}
