//! Cryptographic utilities
//!
//! This module provides:
//! - SHA-256, double SHA-256 and HASH160
//! - ECDSA key management (secp256k1)
//! - Signed-message digests and compact recoverable signatures

pub mod hash;
pub mod keys;
pub mod message;

pub use hash::{double_sha256, double_sha256_hex, hash160, sha256, sha256_hex};
pub use keys::{KeyError, KeyPair, PubKey, COMPRESSED_PUBLIC_KEY_SIZE, PUBLIC_KEY_SIZE};
pub use message::{
    recover_compact, sign_message, signed_message_hash, COMPACT_SIGNATURE_SIZE, MESSAGE_MAGIC,
};
