//! ECDSA key management
//!
//! Provides key pair generation and the serialized public key type used by
//! multisig construction, address derivation and message verification,
//! all on the secp256k1 curve.

use rand::rngs::OsRng;
use secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::hash::hash160;

/// Serialized length of a compressed public key
pub const COMPRESSED_PUBLIC_KEY_SIZE: usize = 33;

/// Serialized length of an uncompressed public key
pub const PUBLIC_KEY_SIZE: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A serialized public key as it appears in scripts and wallets
///
/// Holds the raw encoding; whether it is an actual curve point is checked by
/// [`PubKey::is_fully_valid`].
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PubKey(Vec<u8>);

impl PubKey {
    /// Wrap raw key bytes without validating them
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Parse a hex-encoded key, requiring a compressed or uncompressed length
    pub fn from_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPublicKey)?;
        let key = Self(bytes);
        if !key.is_valid() {
            return Err(KeyError::InvalidPublicKey);
        }
        Ok(key)
    }

    /// Length check against the header byte
    pub fn is_valid(&self) -> bool {
        match self.0.first() {
            Some(0x02) | Some(0x03) => self.0.len() == COMPRESSED_PUBLIC_KEY_SIZE,
            Some(0x04) | Some(0x06) | Some(0x07) => self.0.len() == PUBLIC_KEY_SIZE,
            _ => false,
        }
    }

    /// Length check plus an on-curve check
    pub fn is_fully_valid(&self) -> bool {
        self.is_valid() && PublicKey::from_slice(&self.0).is_ok()
    }

    pub fn is_compressed(&self) -> bool {
        self.0.len() == COMPRESSED_PUBLIC_KEY_SIZE
    }

    /// HASH160 of the serialized key
    pub fn key_id(&self) -> [u8; 20] {
        hash160(&self.0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// Serialize a curve point in the requested form
    pub fn from_public_key(public_key: &PublicKey, compressed: bool) -> Self {
        if compressed {
            Self(public_key.serialize().to_vec())
        } else {
            Self(public_key.serialize_uncompressed().to_vec())
        }
    }
}

impl fmt::Debug for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PubKey({})", self.to_hex())
    }
}

impl fmt::Display for PubKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl TryFrom<String> for PubKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<PubKey> for String {
    fn from(key: PubKey) -> Self {
        key.to_hex()
    }
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    /// Whether the public key is serialized in compressed form
    pub compressed: bool,
}

impl KeyPair {
    /// Generate a new random key pair (compressed)
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
            compressed: true,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey, compressed: bool) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
            compressed,
        }
    }

    /// Create a compressed key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key, true))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// The serialized public key
    pub fn pubkey(&self) -> PubKey {
        PubKey::from_public_key(&self.public_key, self.compressed)
    }

    /// Get the public key as a hex string
    pub fn public_key_hex(&self) -> String {
        self.pubkey().to_hex()
    }

    /// HASH160 of the serialized public key
    pub fn key_id(&self) -> [u8; 20] {
        self.pubkey().key_id()
    }
}
