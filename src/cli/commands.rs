//! CLI commands for the node
//!
//! Implements all command handlers for the CLI interface.

use chrono::{TimeZone, Utc};
use log::info;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

use crate::chain::{ChainFile, ChainReader, MemoryChain};
use crate::cli::config::NodeConfig;
use crate::core::{AddressCodec, Base58Codec, Destination, KeyHash, Network};
use crate::crypto::KeyPair;
use crate::message::sign_message_base64;
use crate::rpc::{self, RpcContext};
use crate::storage::{Storage, StorageConfig};
use crate::wallet::{MemoryKeyStore, WalletFile, WalletKeyStore};
use crate::xbridge::TradeWindow;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Application state
pub struct AppState {
    pub config: NodeConfig,
    pub storage: Storage,
    pub codec: Arc<Base58Codec>,
    pub chain: Arc<RwLock<MemoryChain>>,
    pub wallet: Option<Arc<RwLock<MemoryKeyStore>>>,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load configuration and snapshots from the data directory
    pub fn new(data_dir: PathBuf, network: Option<Network>) -> CliResult<Self> {
        let mut config = NodeConfig::load(&data_dir)?;
        if let Some(network) = network {
            config.network = network;
        }

        let storage = Storage::new(StorageConfig {
            data_dir: data_dir.clone(),
            chain_file: config.chain_file.clone(),
            wallet_file: config.wallet_file.clone(),
            max_backups: config.max_backups,
            ..Default::default()
        })?;

        let codec = Arc::new(Base58Codec::new(config.network));
        let chain = storage.load_chain()?;
        let wallet = storage.load_wallet(codec.as_ref())?;
        info!(
            "Node state loaded from {:?} ({}, wallet: {})",
            data_dir,
            config.network,
            wallet.is_some()
        );

        Ok(Self {
            config,
            storage,
            codec,
            chain: Arc::new(RwLock::new(chain)),
            wallet: wallet.map(|store| Arc::new(RwLock::new(store))),
            data_dir,
        })
    }

    /// Command dispatcher over the shared state
    pub fn rpc_context(&self) -> RpcContext<MemoryChain> {
        let mut ctx = RpcContext::new(self.codec.clone(), self.chain.clone())
            .with_script_size_limit(self.config.redeem_script_limit);
        if let Some(wallet) = &self.wallet {
            ctx = ctx.with_wallet(wallet.clone());
        }
        ctx
    }

    fn wallet(&self) -> Option<&dyn WalletKeyStore> {
        self.wallet
            .as_ref()
            .map(|wallet| &**wallet as &dyn WalletKeyStore)
    }
}

fn print_json(value: &Value) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Describe an address
pub fn cmd_validate_address(state: &AppState, address: &str) -> CliResult<()> {
    let ret = rpc::validate_address(state.codec.as_ref(), state.wallet(), address);
    if ret["isvalid"] == true {
        println!("✅ Valid address");
    } else {
        println!("❌ Invalid address");
    }
    print_json(&ret)
}

/// Build a multisig redeem script and address
pub fn cmd_create_multisig(state: &AppState, required: i64, keys: &[String]) -> CliResult<()> {
    let ret = rpc::create_multisig(
        state.codec.as_ref(),
        state.wallet(),
        state.config.redeem_script_limit,
        required,
        keys,
    )?;
    println!("🔐 {}-of-{} multisig address created!", required, keys.len());
    print_json(&ret)
}

/// Check a signed message
pub fn cmd_verify_message(
    state: &AppState,
    address: &str,
    signature: &str,
    message: &str,
) -> CliResult<()> {
    let verified = rpc::verify_message(state.codec.as_ref(), address, signature, message)?;
    if verified == true {
        println!("✅ Signature is valid for {}", address);
    } else {
        println!("❌ Signature does NOT match {}", address);
    }
    Ok(())
}

/// List recent trade records
pub fn cmd_trading_data(
    state: &AppState,
    blocks: Option<u32>,
    errors: bool,
    json: bool,
) -> CliResult<()> {
    let window = TradeWindow {
        max_blocks: blocks,
        include_errors: errors,
        ..Default::default()
    };
    let chain = state.chain.read().unwrap_or_else(PoisonError::into_inner);
    let records = rpc::get_trading_data(&*chain, state.codec.as_ref(), &window);
    drop(chain);

    if json {
        return print_json(&records);
    }

    let records = records.as_array().cloned().unwrap_or_default();
    if records.is_empty() {
        println!("📭 No trade records in the last 30 days");
        return Ok(());
    }

    println!("📈 Trade records ({}):", records.len());
    for record in &records {
        let when = record["timestamp"]
            .as_i64()
            .and_then(|t| Utc.timestamp_opt(t, 0).single())
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        let txid = record["txid"].as_str().unwrap_or_default();
        if record.get("from").is_some() {
            println!(
                "   {} | {} | {} {} -> {} {} | to {}",
                when,
                &txid[..16.min(txid.len())],
                record["fromAmount"],
                record["from"].as_str().unwrap_or_default(),
                record["toAmount"],
                record["toCurrency"].as_str().unwrap_or_default(),
                record["to"].as_str().unwrap_or_default()
            );
        } else {
            println!(
                "   {} | {} | ⚠️  {}",
                when,
                &txid[..16.min(txid.len())],
                record["xid"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}

/// Sign a message with a hex private key
pub fn cmd_sign_message(
    state: &AppState,
    private_key: &str,
    message: &str,
    uncompressed: bool,
) -> CliResult<()> {
    let key = KeyPair::from_private_key_hex(private_key)?;
    let key = KeyPair::from_secret_key(key.secret_key, !uncompressed);
    let address = state
        .codec
        .encode(&Destination::KeyHash(KeyHash(key.key_id())));
    let signature = sign_message_base64(&key, message)?;

    println!("✍️  Message signed");
    println!("   📍 Address: {}", address);
    println!("   🖊️  Signature: {}", signature);
    Ok(())
}

/// Generate a key pair, optionally recording its public key in the wallet
pub fn cmd_keygen(state: &AppState, save: bool) -> CliResult<()> {
    let key = KeyPair::generate();
    let address = state
        .codec
        .encode(&Destination::KeyHash(KeyHash(key.key_id())));

    println!("🔑 New key pair");
    println!("   📍 Address: {}", address);
    println!("   🔓 Public Key: {}", key.public_key_hex());
    println!("   🔒 Private Key: {}", key.private_key_hex());

    if save {
        let mut file = state.storage.load_wallet_file()?;
        file.keys.push(key.pubkey());
        state.storage.save_wallet(&file)?;
        println!("\n   💾 Public key added to {}", state.config.wallet_file);
    }
    println!("\n   ⚠️  IMPORTANT: The private key is not stored. Back it up now!");
    Ok(())
}

/// Run a raw command with JSON parameters
pub fn cmd_call(state: &AppState, method: &str, params: &[String]) -> CliResult<()> {
    // bare words are taken as strings
    let params: Vec<Value> = params
        .iter()
        .map(|p| serde_json::from_str(p).unwrap_or_else(|_| Value::String(p.clone())))
        .collect();

    match state.rpc_context().call(method, &params) {
        Ok(result) => print_json(&result),
        Err(err) => {
            println!("❌ {}", err);
            print_json(&err.to_json())
        }
    }
}

/// Display chain tip information
pub fn cmd_chain_info(state: &AppState) -> CliResult<()> {
    let chain = state.chain.read().unwrap_or_else(PoisonError::into_inner);
    match chain.tip() {
        Some(tip) => {
            let when = Utc
                .timestamp_opt(tip.time, 0)
                .single()
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            println!("⛓️  Chain Info ({})", state.config.network);
            println!("   ├─ Height: {}", tip.height);
            println!("   ├─ Tip time: {}", when);
            println!("   └─ Tip hash: {}", tip.hash);
        }
        None => println!("📭 Chain is empty ({:?})", state.data_dir),
    }
    Ok(())
}

/// List the backups kept for the chain or wallet snapshot
pub fn cmd_backups(state: &AppState, wallet: bool) -> CliResult<()> {
    let file_name = snapshot_name(state, wallet);
    let backups = state.storage.list_backups(file_name);

    if backups.is_empty() {
        println!("📭 No backups of {}", file_name);
        return Ok(());
    }
    println!("🗄️  Backups of {} (0 is newest):", file_name);
    for index in backups {
        println!("   └─ {}.backup.{}", file_name, index);
    }
    Ok(())
}

/// Replace the chain or wallet snapshot with one of its backups
pub fn cmd_restore(state: &AppState, index: usize, wallet: bool) -> CliResult<()> {
    let file_name = snapshot_name(state, wallet);

    if wallet {
        let file: WalletFile = state.storage.restore_backup(file_name, index)?;
        // reject before overwriting the current snapshot
        let store = file.clone().into_store(state.codec.as_ref())?;
        state.storage.save_wallet(&file)?;
        if let Some(current) = &state.wallet {
            *current.write().unwrap_or_else(PoisonError::into_inner) = store;
        }
    } else {
        let file: ChainFile = state.storage.restore_backup(file_name, index)?;
        let chain = MemoryChain::from_file(file)?;
        state.storage.save_chain(&chain)?;
        *state.chain.write().unwrap_or_else(PoisonError::into_inner) = chain;
    }

    println!("📥 {} restored from backup {}", file_name, index);
    Ok(())
}

fn snapshot_name(state: &AppState, wallet: bool) -> &str {
    if wallet {
        &state.config.wallet_file
    } else {
        &state.config.chain_file
    }
}
