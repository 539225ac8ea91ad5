//! Key resolution for multisig construction
//!
//! A key argument is either an address whose full public key the wallet
//! holds, or a hex-encoded public key. Addresses are tried first.

use log::debug;
use thiserror::Error;

use crate::core::{AddressCodec, Destination};
use crate::crypto::PubKey;
use crate::wallet::WalletKeyStore;

/// Key resolution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0} does not refer to a key")]
    NotKeyAddress(String),
    #[error("no full public key for address {0}")]
    NoPublicKey(String),
    #[error("Invalid public key: {0}")]
    InvalidKeyInput(String),
}

/// Resolves user-supplied key strings to validated public keys
#[derive(Clone, Copy)]
pub struct KeyResolver<'a> {
    codec: &'a dyn AddressCodec,
    wallet: Option<&'a dyn WalletKeyStore>,
}

impl<'a> KeyResolver<'a> {
    /// Without a wallet only hex keys resolve
    pub fn new(codec: &'a dyn AddressCodec, wallet: Option<&'a dyn WalletKeyStore>) -> Self {
        Self { codec, wallet }
    }

    pub fn resolve(&self, input: &str) -> Result<PubKey, ResolveError> {
        if let Some(wallet) = self.wallet {
            if let Some(destination) = self.codec.decode(input) {
                return Self::resolve_address(wallet, input, &destination);
            }
        }

        let key = PubKey::from_hex(input)
            .map_err(|_| ResolveError::InvalidKeyInput(input.to_string()))?;
        if !key.is_fully_valid() {
            return Err(ResolveError::InvalidKeyInput(input.to_string()));
        }
        debug!("resolved hex key {}", input);
        Ok(key)
    }

    fn resolve_address(
        wallet: &dyn WalletKeyStore,
        input: &str,
        destination: &Destination,
    ) -> Result<PubKey, ResolveError> {
        let key_hash = match destination {
            Destination::KeyHash(hash) => hash,
            Destination::ScriptHash(_) | Destination::None => {
                return Err(ResolveError::NotKeyAddress(input.to_string()))
            }
        };
        let key = wallet
            .lookup_pubkey(key_hash)
            .ok_or_else(|| ResolveError::NoPublicKey(input.to_string()))?;
        if !key.is_fully_valid() {
            return Err(ResolveError::InvalidKeyInput(input.to_string()));
        }
        debug!("resolved address {} through wallet", input);
        Ok(key)
    }
}
