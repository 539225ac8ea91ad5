//! Base58Check address encoding
//!
//! Addresses are `Base58Check(version || hash160)` where the version byte
//! tells key-hash and script-hash destinations apart per network.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::core::destination::{Destination, KeyHash, ScriptHash};
use crate::crypto::double_sha256;

/// Address parsing errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding")]
    InvalidBase58,
    #[error("Invalid address length: {0}")]
    InvalidLength(usize),
    #[error("Checksum mismatch")]
    BadChecksum,
    #[error("Unknown address version: {0}")]
    UnknownVersion(u8),
    #[error("Unknown network: {0}")]
    UnknownNetwork(String),
}

/// Converts between destinations and their textual address form
pub trait AddressCodec: Send + Sync {
    /// Encode a destination; `None` has no address and encodes as empty
    fn encode(&self, destination: &Destination) -> String;

    /// Decode an address string, `None` if it is not a valid address
    fn decode(&self, address: &str) -> Option<Destination>;
}

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    /// Version byte prefixed to key-hash addresses
    pub fn pubkey_address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 26,
            Network::Testnet | Network::Regtest => 139,
        }
    }

    /// Version byte prefixed to script-hash addresses
    pub fn script_address_version(&self) -> u8 {
        match self {
            Network::Mainnet => 28,
            Network::Testnet | Network::Regtest => 19,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(AddressError::UnknownNetwork(other.to_string())),
        }
    }
}

/// Base58Check codec for one network's version bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Base58Codec {
    pubkey_version: u8,
    script_version: u8,
}

impl Base58Codec {
    pub fn new(network: Network) -> Self {
        Self {
            pubkey_version: network.pubkey_address_version(),
            script_version: network.script_address_version(),
        }
    }

    /// Decode, reporting why an address was rejected
    pub fn parse(&self, address: &str) -> Result<Destination, AddressError> {
        let bytes = bs58::decode(address)
            .into_vec()
            .map_err(|_| AddressError::InvalidBase58)?;
        if bytes.len() != 25 {
            return Err(AddressError::InvalidLength(bytes.len()));
        }

        let (payload, checksum) = bytes.split_at(21);
        if double_sha256(payload)[..4] != *checksum {
            return Err(AddressError::BadChecksum);
        }

        let mut hash = [0u8; 20];
        hash.copy_from_slice(&payload[1..]);
        match payload[0] {
            v if v == self.pubkey_version => Ok(Destination::KeyHash(KeyHash(hash))),
            v if v == self.script_version => Ok(Destination::ScriptHash(ScriptHash(hash))),
            v => Err(AddressError::UnknownVersion(v)),
        }
    }

    fn encode_with_version(version: u8, hash: &[u8; 20]) -> String {
        let mut address_bytes = Vec::with_capacity(25);
        address_bytes.push(version);
        address_bytes.extend_from_slice(hash);

        // Checksum is the first 4 bytes of double SHA256
        let checksum = double_sha256(&address_bytes);
        address_bytes.extend_from_slice(&checksum[..4]);

        bs58::encode(address_bytes).into_string()
    }
}

impl Default for Base58Codec {
    fn default() -> Self {
        Self::new(Network::default())
    }
}

impl AddressCodec for Base58Codec {
    fn encode(&self, destination: &Destination) -> String {
        match destination {
            Destination::None => String::new(),
            Destination::KeyHash(hash) => Self::encode_with_version(self.pubkey_version, &hash.0),
            Destination::ScriptHash(hash) => {
                Self::encode_with_version(self.script_version, &hash.0)
            }
        }
    }

    fn decode(&self, address: &str) -> Option<Destination> {
        self.parse(address).ok()
    }
}
