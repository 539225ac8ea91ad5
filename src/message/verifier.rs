//! Message signature verification by public-key recovery

use base64::{engine::general_purpose, Engine as _};
use log::debug;
use thiserror::Error;

use crate::core::{AddressCodec, Destination};
use crate::crypto::{
    recover_compact, sign_message, signed_message_hash, KeyError, KeyPair,
    COMPACT_SIGNATURE_SIZE,
};

/// Message verification errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Invalid address")]
    InvalidAddress,
    #[error("Address does not refer to key")]
    NotKeyAddress,
    #[error("Malformed base64 encoding")]
    MalformedSignature,
}

/// Checks signed messages against key-hash addresses
#[derive(Clone, Copy)]
pub struct SignatureVerifier<'a> {
    codec: &'a dyn AddressCodec,
}

impl<'a> SignatureVerifier<'a> {
    pub fn new(codec: &'a dyn AddressCodec) -> Self {
        Self { codec }
    }

    /// Verify a base64 compact signature over `message`
    ///
    /// Input errors, including a signature that is not exactly one compact
    /// signature long, are reported as `Err`; a signature that does not
    /// recover to the address is `Ok(false)`.
    pub fn verify(
        &self,
        address: &str,
        signature: &str,
        message: &str,
    ) -> Result<bool, MessageError> {
        let key_hash = match self.codec.decode(address) {
            Some(Destination::KeyHash(hash)) => hash,
            Some(Destination::ScriptHash(_)) => return Err(MessageError::NotKeyAddress),
            Some(Destination::None) | None => return Err(MessageError::InvalidAddress),
        };

        let sig_bytes = general_purpose::STANDARD
            .decode(signature)
            .map_err(|_| MessageError::MalformedSignature)?;
        if sig_bytes.len() != COMPACT_SIGNATURE_SIZE {
            return Err(MessageError::MalformedSignature);
        }

        let digest = signed_message_hash(message.as_bytes());
        match recover_compact(&digest, &sig_bytes) {
            Ok(pubkey) => {
                let matches = pubkey.key_id() == key_hash.0;
                debug!("recovered key {} matches={}", pubkey, matches);
                Ok(matches)
            }
            Err(e) => {
                debug!("signature recovery failed: {}", e);
                Ok(false)
            }
        }
    }
}

/// Sign `message` with a key pair, returning the base64 compact signature
pub fn sign_message_base64(key: &KeyPair, message: &str) -> Result<String, KeyError> {
    let sig = sign_message(&key.secret_key, key.compressed, message.as_bytes())?;
    Ok(general_purpose::STANDARD.encode(sig))
}
