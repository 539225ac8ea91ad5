//! Address destinations
//!
//! The addressable target behind an address string: nothing, a key hash, or
//! a script hash.

use serde::{Deserialize, Serialize};
use std::fmt;

/// HASH160 of a serialized public key
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyHash(pub [u8; 20]);

/// HASH160 of a serialized script
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptHash(pub [u8; 20]);

impl KeyHash {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl ScriptHash {
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        bytes.try_into().ok().map(Self)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeyHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyHash({})", self.to_hex())
    }
}

impl fmt::Debug for ScriptHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ScriptHash({})", self.to_hex())
    }
}

/// What an address pays to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Destination {
    #[default]
    None,
    KeyHash(KeyHash),
    ScriptHash(ScriptHash),
}

impl Destination {
    pub fn is_valid(&self) -> bool {
        !matches!(self, Destination::None)
    }

    pub fn key_hash(&self) -> Option<KeyHash> {
        match self {
            Destination::KeyHash(hash) => Some(*hash),
            Destination::None | Destination::ScriptHash(_) => None,
        }
    }
}

impl From<KeyHash> for Destination {
    fn from(hash: KeyHash) -> Self {
        Destination::KeyHash(hash)
    }
}

impl From<ScriptHash> for Destination {
    fn from(hash: ScriptHash) -> Self {
        Destination::ScriptHash(hash)
    }
}
