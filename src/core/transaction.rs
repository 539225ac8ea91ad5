//! Transaction data as read from block storage
//!
//! Only what the query commands need: outputs with their scripts, plus
//! enough of the input side to give every transaction a stable id.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::script::Script;
use crate::crypto::double_sha256;
use crate::crypto::message::write_compact_size;

// =============================================================================
// Constants
// =============================================================================

/// Current transaction version
pub const TX_VERSION: u32 = 1;

/// Sequence number that disables locktime
pub const SEQUENCE_FINAL: u32 = 0xFFFFFFFF;

/// Transaction id parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TxidError {
    #[error("Invalid txid: {0}")]
    InvalidTxid(String),
}

/// A 32-byte transaction id, held and written in display (byte-reversed) order
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Txid([u8; 32]);

impl Txid {
    /// Parse a 64-character display hex id
    pub fn from_hex(s: &str) -> Result<Self, TxidError> {
        let bytes = hex::decode(s).map_err(|_| TxidError::InvalidTxid(s.to_string()))?;
        let id: [u8; 32] = bytes
            .try_into()
            .map_err(|_| TxidError::InvalidTxid(s.to_string()))?;
        Ok(Self(id))
    }

    /// Id of a double SHA-256 digest in internal byte order
    pub fn from_hash(mut hash: [u8; 32]) -> Self {
        hash.reverse();
        Self(hash)
    }

    /// Bytes in internal (serialization) order
    pub fn to_internal_bytes(&self) -> [u8; 32] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Txid({})", self.to_hex())
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for Txid {
    type Error = TxidError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Txid> for String {
    fn from(txid: Txid) -> Self {
        txid.to_hex()
    }
}

/// Transaction input (reference to previous output)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TxIn {
    /// Id of the transaction holding the spent output
    pub prev_txid: Txid,
    /// Index of the spent output
    pub prev_index: u32,
    #[serde(default)]
    pub script_sig: Script,
    #[serde(default = "default_sequence")]
    pub sequence: u32,
}

fn default_sequence() -> u32 {
    SEQUENCE_FINAL
}

/// Transaction output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TxOut {
    /// Value in base units
    pub value: u64,
    pub script_pubkey: Script,
}

impl TxOut {
    pub fn new(value: u64, script_pubkey: Script) -> Self {
        Self {
            value,
            script_pubkey,
        }
    }
}

/// A transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    #[serde(default)]
    pub lock_time: u32,
}

fn default_version() -> u32 {
    TX_VERSION
}

impl Transaction {
    /// A transaction with the given outputs and no inputs
    pub fn with_outputs(outputs: Vec<TxOut>) -> Self {
        Self {
            version: TX_VERSION,
            inputs: Vec::new(),
            outputs,
            lock_time: 0,
        }
    }

    /// Canonical byte serialization
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&self.version.to_le_bytes());

        write_compact_size(&mut out, self.inputs.len() as u64);
        for input in &self.inputs {
            out.extend_from_slice(&input.prev_txid.to_internal_bytes());
            out.extend_from_slice(&input.prev_index.to_le_bytes());
            write_compact_size(&mut out, input.script_sig.len() as u64);
            out.extend_from_slice(input.script_sig.as_bytes());
            out.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_compact_size(&mut out, self.outputs.len() as u64);
        for output in &self.outputs {
            out.extend_from_slice(&output.value.to_le_bytes());
            write_compact_size(&mut out, output.script_pubkey.len() as u64);
            out.extend_from_slice(output.script_pubkey.as_bytes());
        }

        out.extend_from_slice(&self.lock_time.to_le_bytes());
        out
    }

    /// Transaction id: double SHA-256 of the serialization, byte-reversed hex
    pub fn txid(&self) -> String {
        Txid::from_hash(double_sha256(&self.serialize())).to_hex()
    }
}
