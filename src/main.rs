//! xchain-rpc CLI Application
//!
//! A command-line interface for the node's query commands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use xchain_rpc::cli::{self, AppState};
use xchain_rpc::core::Network;

#[derive(Parser)]
#[command(name = "xchain-rpc")]
#[command(author = "Darshan")]
#[command(version = "0.1.0")]
#[command(about = "Multisig, signed-message and cross-chain trade queries", long_about = None)]
struct Cli {
    /// Data directory holding config, chain and wallet snapshots
    #[arg(short, long, default_value = ".xchain_data")]
    data_dir: PathBuf,

    /// Network whose address format to use (overrides config.json)
    #[arg(short, long)]
    network: Option<Network>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Describe an address
    ValidateAddress {
        address: String,
    },

    /// Create an M-of-N multisig address
    CreateMultisig {
        /// Signatures required to spend
        #[arg(short, long, allow_negative_numbers = true)]
        required: i64,

        /// Hex public keys or wallet addresses, in script order
        #[arg(required = true)]
        keys: Vec<String>,
    },

    /// Verify a signed message
    VerifyMessage {
        address: String,
        /// Base64 compact signature
        signature: String,
        message: String,
    },

    /// List recent cross-chain trade records
    TradingData {
        /// Maximum number of blocks to scan
        #[arg(short, long)]
        blocks: Option<u32>,

        /// Include undecodable trade records
        #[arg(short, long)]
        errors: bool,

        /// Print raw JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign a message with a hex private key
    SignMessage {
        /// Hex-encoded private key
        #[arg(short, long)]
        key: String,

        message: String,

        /// Sign for the uncompressed public key's address
        #[arg(long)]
        uncompressed: bool,
    },

    /// Generate a new key pair
    Keygen {
        /// Add the public key to the wallet snapshot
        #[arg(short, long)]
        save: bool,
    },

    /// Display chain tip information
    Chain,

    /// List snapshot backups
    Backups {
        /// Wallet snapshot instead of the chain
        #[arg(short, long)]
        wallet: bool,
    },

    /// Restore a snapshot from a backup
    Restore {
        /// Backup index, 0 being the newest
        #[arg(short, long, default_value = "0")]
        index: usize,

        /// Wallet snapshot instead of the chain
        #[arg(short, long)]
        wallet: bool,
    },

    /// Run a command by name with JSON parameters
    Call {
        method: String,
        params: Vec<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let state = AppState::new(cli.data_dir, cli.network)?;

    match cli.command {
        Commands::ValidateAddress { address } => {
            cli::cmd_validate_address(&state, &address)?;
        }
        Commands::CreateMultisig { required, keys } => {
            cli::cmd_create_multisig(&state, required, &keys)?;
        }
        Commands::VerifyMessage {
            address,
            signature,
            message,
        } => {
            cli::cmd_verify_message(&state, &address, &signature, &message)?;
        }
        Commands::TradingData {
            blocks,
            errors,
            json,
        } => {
            cli::cmd_trading_data(&state, blocks, errors, json)?;
        }
        Commands::SignMessage {
            key,
            message,
            uncompressed,
        } => {
            cli::cmd_sign_message(&state, &key, &message, uncompressed)?;
        }
        Commands::Keygen { save } => {
            cli::cmd_keygen(&state, save)?;
        }
        Commands::Chain => {
            cli::cmd_chain_info(&state)?;
        }
        Commands::Backups { wallet } => {
            cli::cmd_backups(&state, wallet)?;
        }
        Commands::Restore { index, wallet } => {
            cli::cmd_restore(&state, index, wallet)?;
        }
        Commands::Call { method, params } => {
            cli::cmd_call(&state, &method, &params)?;
        }
    }

    Ok(())
}
