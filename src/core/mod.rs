//! Core blockchain components
//!
//! This module contains the fundamental building blocks:
//! - Scripts (encoding, standard templates, classification)
//! - Destinations and Base58Check addresses
//! - Transactions and blocks as read from storage

pub mod address;
pub mod block;
pub mod destination;
pub mod script;
pub mod transaction;

pub use address::{AddressCodec, AddressError, Base58Codec, Network};
pub use block::Block;
pub use destination::{Destination, KeyHash, ScriptHash};
pub use script::{
    extract_destinations, solve, ExtractedDestinations, Instruction, Script, ScriptBuilder,
    ScriptClass, ScriptError, Solution, MAX_PUBKEYS_PER_MULTISIG, MAX_SCRIPT_ELEMENT_SIZE,
    MAX_SCRIPT_SIZE,
};
pub use transaction::{
    Transaction, TxIn, TxOut, Txid, TxidError, SEQUENCE_FINAL, TX_VERSION,
};
