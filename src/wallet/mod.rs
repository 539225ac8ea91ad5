//! Wallet module: key and script lookups used by the query commands

pub mod keystore;

pub use keystore::{IsMine, MemoryKeyStore, WalletError, WalletFile, WalletKeyStore};
