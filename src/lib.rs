//! xchain-rpc: query commands of a cross-chain trading node
//!
//! This crate provides:
//! - M-of-N multisig redeem scripts and their script-hash addresses
//! - Signed-message verification by public-key recovery
//! - Address validation with wallet descriptions of the destination
//! - Cross-chain trade records decoded from recent blocks
//! - JSON snapshot persistence for the chain and wallet
//!
//! # Example
//!
//! ```rust
//! use xchain_rpc::core::Base58Codec;
//! use xchain_rpc::crypto::KeyPair;
//! use xchain_rpc::multisig::{KeyResolver, MultisigScriptBuilder};
//!
//! let codec = Base58Codec::default();
//! let keys = vec![
//!     KeyPair::generate().public_key_hex(),
//!     KeyPair::generate().public_key_hex(),
//! ];
//!
//! // Build a 2-of-2 redeem script from hex keys
//! let builder = MultisigScriptBuilder::new(KeyResolver::new(&codec, None));
//! let redeem = builder.build(2, &keys).unwrap();
//! println!("Address: {}", redeem.address(&codec));
//! println!("Redeem script: {}", redeem.script().to_hex());
//! ```

pub mod chain;
pub mod cli;
pub mod core;
pub mod crypto;
pub mod message;
pub mod multisig;
pub mod rpc;
pub mod storage;
pub mod wallet;
pub mod xbridge;

// Re-export commonly used types
pub use chain::{ChainReader, MemoryChain};
pub use core::{AddressCodec, Base58Codec, Destination, Network, Script};
pub use crypto::{KeyPair, PubKey};
pub use message::SignatureVerifier;
pub use multisig::{KeyResolver, MultisigScriptBuilder, RedeemScript};
pub use rpc::{RpcContext, RpcError};
pub use storage::Storage;
pub use wallet::{MemoryKeyStore, WalletKeyStore};
pub use xbridge::{CurrencyPairDecoder, TradeLedgerScanner, TradeWindow};
