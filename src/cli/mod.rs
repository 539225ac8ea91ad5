//! Command-line front end: configuration, state and command handlers

pub mod commands;
pub mod config;

pub use commands::{
    cmd_backups, cmd_call, cmd_chain_info, cmd_create_multisig, cmd_keygen, cmd_restore,
    cmd_sign_message, cmd_trading_data, cmd_validate_address, cmd_verify_message, AppState,
    CliResult,
};
pub use config::{ConfigError, NodeConfig, CONFIG_FILE};
