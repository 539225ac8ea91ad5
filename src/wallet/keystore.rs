//! Wallet key store
//!
//! The lookups the query commands make against wallet state, an in-memory
//! store that can be loaded from a JSON wallet snapshot, and a lock adapter
//! so shared stores take their read lock once per lookup.

use bitflags::bitflags;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::core::{
    extract_destinations, AddressCodec, Destination, KeyHash, Script, ScriptHash,
};
use crate::crypto::PubKey;

bitflags! {
    /// How a destination relates to the wallet
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct IsMine: u8 {
        const SPENDABLE = 0b01;
        const WATCH_ONLY = 0b10;
    }
}

impl IsMine {
    /// Not related to the wallet at all
    pub const NO: IsMine = IsMine::empty();
}

/// Wallet-related errors
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid wallet entry: {0}")]
    InvalidEntry(String),
}

/// Read-only wallet lookups
pub trait WalletKeyStore: Send + Sync {
    /// Full public key behind a key hash, if the wallet has it
    fn lookup_pubkey(&self, key_hash: &KeyHash) -> Option<PubKey>;

    /// Redeem script behind a script hash, if the wallet has it
    fn lookup_script(&self, script_hash: &ScriptHash) -> Option<Script>;

    /// Ownership of a destination
    fn is_mine(&self, destination: &Destination) -> IsMine;

    /// Address-book label for a destination
    fn account(&self, destination: &Destination) -> Option<String>;

    /// Whether the wallet can sign for the key
    fn is_spendable(&self, key_hash: &KeyHash) -> bool {
        self.is_mine(&Destination::KeyHash(*key_hash))
            .contains(IsMine::SPENDABLE)
    }
}

/// Each call takes the read lock for that single lookup only
impl<S: WalletKeyStore> WalletKeyStore for RwLock<S> {
    fn lookup_pubkey(&self, key_hash: &KeyHash) -> Option<PubKey> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup_pubkey(key_hash)
    }

    fn lookup_script(&self, script_hash: &ScriptHash) -> Option<Script> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .lookup_script(script_hash)
    }

    fn is_mine(&self, destination: &Destination) -> IsMine {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_mine(destination)
    }

    fn account(&self, destination: &Destination) -> Option<String> {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .account(destination)
    }

    fn is_spendable(&self, key_hash: &KeyHash) -> bool {
        self.read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_spendable(key_hash)
    }
}

#[derive(Debug, Clone)]
struct KeyEntry {
    pubkey: PubKey,
    spendable: bool,
}

/// In-memory key store
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyStore {
    keys: HashMap<KeyHash, KeyEntry>,
    scripts: HashMap<ScriptHash, Script>,
    watch_only: HashSet<Destination>,
    labels: HashMap<Destination, String>,
}

impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key the wallet holds the private half of
    pub fn add_key(&mut self, pubkey: PubKey) -> KeyHash {
        self.insert_key(pubkey, true)
    }

    /// Add a public key without signing ability
    pub fn add_watch_key(&mut self, pubkey: PubKey) -> KeyHash {
        let hash = self.insert_key(pubkey, false);
        self.watch_only.insert(Destination::KeyHash(hash));
        hash
    }

    fn insert_key(&mut self, pubkey: PubKey, spendable: bool) -> KeyHash {
        let hash = KeyHash(pubkey.key_id());
        self.keys.insert(hash, KeyEntry { pubkey, spendable });
        hash
    }

    /// Add a redeem script
    pub fn add_script(&mut self, script: Script) -> ScriptHash {
        let hash = script.script_hash();
        self.scripts.insert(hash, script);
        hash
    }

    /// Watch a destination without holding any key material
    pub fn add_watch_only(&mut self, destination: Destination) {
        self.watch_only.insert(destination);
    }

    pub fn set_label(&mut self, destination: Destination, label: impl Into<String>) {
        self.labels.insert(destination, label.into());
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    /// Spendable if every key the script references is spendable
    fn script_is_mine(&self, script: &Script) -> IsMine {
        let extracted = extract_destinations(script);
        let key_hashes: Vec<KeyHash> = extracted
            .destinations
            .iter()
            .filter_map(Destination::key_hash)
            .collect();
        if !key_hashes.is_empty() && key_hashes.iter().all(|h| self.key_spendable(h)) {
            IsMine::SPENDABLE
        } else {
            IsMine::NO
        }
    }

    fn key_spendable(&self, hash: &KeyHash) -> bool {
        self.keys.get(hash).map(|e| e.spendable).unwrap_or(false)
    }
}

impl WalletKeyStore for MemoryKeyStore {
    fn lookup_pubkey(&self, key_hash: &KeyHash) -> Option<PubKey> {
        let found = self.keys.get(key_hash).map(|e| e.pubkey.clone());
        debug!("pubkey lookup {:?}: {}", key_hash, found.is_some());
        found
    }

    fn lookup_script(&self, script_hash: &ScriptHash) -> Option<Script> {
        let found = self.scripts.get(script_hash).cloned();
        debug!("script lookup {:?}: {}", script_hash, found.is_some());
        found
    }

    fn is_mine(&self, destination: &Destination) -> IsMine {
        let mine = match destination {
            Destination::None => IsMine::NO,
            Destination::KeyHash(hash) if self.key_spendable(hash) => IsMine::SPENDABLE,
            Destination::KeyHash(_) => IsMine::NO,
            Destination::ScriptHash(hash) => self
                .scripts
                .get(hash)
                .map(|script| self.script_is_mine(script))
                .unwrap_or(IsMine::NO),
        };
        if mine.is_empty() && self.watch_only.contains(destination) {
            return IsMine::WATCH_ONLY;
        }
        mine
    }

    fn account(&self, destination: &Destination) -> Option<String> {
        self.labels.get(destination).cloned()
    }
}

// =============================================================================
// Wallet snapshot
// =============================================================================

/// JSON form of a wallet, as kept in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalletFile {
    /// Keys the wallet can sign with
    #[serde(default)]
    pub keys: Vec<PubKey>,
    /// Public keys held without signing ability
    #[serde(default)]
    pub watch_keys: Vec<PubKey>,
    /// Redeem scripts
    #[serde(default)]
    pub scripts: Vec<Script>,
    /// Watched addresses
    #[serde(default)]
    pub watch_addresses: Vec<String>,
    /// Address book: address -> label
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl WalletFile {
    /// Build a key store, decoding addresses with the given codec
    pub fn into_store(
        self,
        codec: &dyn AddressCodec,
    ) -> Result<MemoryKeyStore, WalletError> {
        let mut store = MemoryKeyStore::new();
        for key in self.keys {
            store.add_key(key);
        }
        for key in self.watch_keys {
            store.add_watch_key(key);
        }
        for script in self.scripts {
            store.add_script(script);
        }
        for address in self.watch_addresses {
            let dest = codec
                .decode(&address)
                .ok_or_else(|| WalletError::InvalidEntry(address.clone()))?;
            store.add_watch_only(dest);
        }
        for (address, label) in self.labels {
            let dest = codec
                .decode(&address)
                .ok_or_else(|| WalletError::InvalidEntry(address.clone()))?;
            store.set_label(dest, label);
        }
        Ok(store)
    }
}
