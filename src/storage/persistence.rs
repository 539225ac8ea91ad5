//! Snapshot persistence layer
//!
//! Chain and wallet snapshots are JSON files in the data directory. Writes go
//! through a temporary file and an atomic rename, with rotating backups.

use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::chain::{ChainError, ChainFile, MemoryChain};
use crate::core::AddressCodec;
use crate::wallet::{MemoryKeyStore, WalletError, WalletFile};

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Chain error: {0}")]
    Chain(#[from] ChainError),
    #[error("Wallet error: {0}")]
    Wallet(#[from] WalletError),
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub chain_file: String,
    pub wallet_file: String,
    pub backup_enabled: bool,
    pub max_backups: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".xchain_data"),
            chain_file: "chain.json".to_string(),
            wallet_file: "wallet.json".to_string(),
            backup_enabled: true,
            max_backups: 5,
        }
    }
}

/// Snapshot storage manager
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    fn path(&self, file_name: &str) -> PathBuf {
        self.config.data_dir.join(file_name)
    }

    fn backup_path(&self, file_name: &str, index: usize) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.backup.{}", file_name, index))
    }

    /// Write a snapshot, backing up the previous one
    pub fn save<T: Serialize>(&self, file_name: &str, value: &T) -> Result<(), StorageError> {
        let path = self.path(file_name);

        if self.config.backup_enabled && self.config.max_backups > 0 && path.exists() {
            self.rotate_backups(file_name)?;
            fs::copy(&path, self.backup_path(file_name, 0))?;
        }

        // Write to temporary file first
        let temp_path = self.path(&format!("{}.tmp", file_name));
        let file = fs::File::create(&temp_path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, value)?;

        // Atomic rename
        fs::rename(&temp_path, &path)?;
        debug!("saved {}", path.display());
        Ok(())
    }

    /// Read a snapshot
    pub fn load<T: DeserializeOwned>(&self, file_name: &str) -> Result<T, StorageError> {
        let path = self.path(file_name);
        if !path.exists() {
            return Err(StorageError::InvalidData(format!(
                "{} not found",
                path.display()
            )));
        }
        load_from_file(&path)
    }

    pub fn exists(&self, file_name: &str) -> bool {
        self.path(file_name).exists()
    }

    fn rotate_backups(&self, file_name: &str) -> Result<(), StorageError> {
        // Delete oldest backup
        let oldest = self.backup_path(file_name, self.config.max_backups - 1);
        if oldest.exists() {
            fs::remove_file(&oldest)?;
        }

        // Shift existing backups
        for i in (0..self.config.max_backups - 1).rev() {
            let current = self.backup_path(file_name, i);
            if current.exists() {
                fs::rename(&current, self.backup_path(file_name, i + 1))?;
            }
        }
        Ok(())
    }

    /// Read backup `index` of a snapshot, 0 being the newest
    pub fn restore_backup<T: DeserializeOwned>(
        &self,
        file_name: &str,
        index: usize,
    ) -> Result<T, StorageError> {
        let backup_path = self.backup_path(file_name, index);
        if !backup_path.exists() {
            return Err(StorageError::InvalidData(format!(
                "Backup {} of {} not found",
                index, file_name
            )));
        }
        load_from_file(&backup_path)
    }

    /// List available backups of a snapshot
    pub fn list_backups(&self, file_name: &str) -> Vec<usize> {
        (0..self.config.max_backups)
            .filter(|i| self.backup_path(file_name, *i).exists())
            .collect()
    }

    // =========================================================================
    // Chain and wallet snapshots
    // =========================================================================

    pub fn save_chain(&self, chain: &MemoryChain) -> Result<(), StorageError> {
        self.save(&self.config.chain_file, &chain.to_file())
    }

    /// Load the chain, or an empty one if no snapshot exists
    pub fn load_chain(&self) -> Result<MemoryChain, StorageError> {
        if !self.exists(&self.config.chain_file) {
            info!(
                "No chain snapshot in {}, starting empty",
                self.config.data_dir.display()
            );
            return Ok(MemoryChain::new());
        }
        let file: ChainFile = self.load(&self.config.chain_file)?;
        let chain = MemoryChain::from_file(file)?;
        info!("Loaded chain with tip height {:?}", chain.height());
        Ok(chain)
    }

    pub fn save_wallet(&self, wallet: &WalletFile) -> Result<(), StorageError> {
        self.save(&self.config.wallet_file, wallet)
    }

    /// Load the wallet snapshot as a key store, `None` if there is none
    pub fn load_wallet(
        &self,
        codec: &dyn AddressCodec,
    ) -> Result<Option<MemoryKeyStore>, StorageError> {
        if !self.exists(&self.config.wallet_file) {
            return Ok(None);
        }
        let file: WalletFile = self.load(&self.config.wallet_file)?;
        let store = file.into_store(codec)?;
        info!("Loaded wallet with {} keys", store.key_count());
        Ok(Some(store))
    }

    pub fn load_wallet_file(&self) -> Result<WalletFile, StorageError> {
        if !self.exists(&self.config.wallet_file) {
            return Ok(WalletFile::default());
        }
        self.load(&self.config.wallet_file)
    }
}

/// Load a JSON snapshot from a specific file path
pub fn load_from_file<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainReader;
    use crate::core::{Base58Codec, Block, Script, Transaction, TxOut};
    use crate::crypto::KeyPair;
    use crate::wallet::WalletKeyStore;

    fn storage(dir: &tempfile::TempDir, max_backups: usize) -> Storage {
        let config = StorageConfig {
            data_dir: dir.path().to_path_buf(),
            max_backups,
            ..Default::default()
        };
        Storage::new(config).unwrap()
    }

    #[test]
    fn test_save_load_chain() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(&temp_dir, 5);

        let mut chain = MemoryChain::new();
        chain
            .push_block(Block::new("00".into(), String::new(), 10, vec![]))
            .unwrap();
        let tx = Transaction::with_outputs(vec![TxOut::new(7, Script::null_data(b"hi"))]);
        chain
            .push_block(Block::new("01".into(), "00".into(), 20, vec![tx]))
            .unwrap();
        chain.prune(0);

        storage.save_chain(&chain).unwrap();
        let loaded = storage.load_chain().unwrap();
        assert_eq!(loaded.height(), Some(1));
        assert_eq!(loaded.get_block(1), chain.get_block(1));
        let genesis = loaded.parent(&loaded.tip().unwrap()).unwrap();
        assert!(loaded.read_block(&genesis).is_err());
    }

    #[test]
    fn test_chain_with_malformed_prev_txid_is_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(&temp_dir, 5);
        let snapshot = r#"{
            "blocks": [{
                "hash": "00",
                "time": 0,
                "transactions": [{
                    "inputs": [{"prev_txid": "not-a-txid", "prev_index": 0}],
                    "outputs": []
                }]
            }]
        }"#;
        fs::write(temp_dir.path().join("chain.json"), snapshot).unwrap();

        assert!(matches!(
            storage.load_chain(),
            Err(StorageError::SerializationError(_))
        ));
    }

    #[test]
    fn test_missing_snapshots() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(&temp_dir, 5);
        assert_eq!(storage.load_chain().unwrap().height(), None);
        assert!(storage.load_wallet(&Base58Codec::default()).unwrap().is_none());
        assert!(storage.load::<WalletFile>("nothing.json").is_err());
    }

    #[test]
    fn test_save_load_wallet() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(&temp_dir, 5);
        let key = KeyPair::generate().pubkey();

        let file = WalletFile {
            keys: vec![key.clone()],
            ..Default::default()
        };
        storage.save_wallet(&file).unwrap();

        let store = storage
            .load_wallet(&Base58Codec::default())
            .unwrap()
            .unwrap();
        let hash = crate::core::KeyHash(key.key_id());
        assert_eq!(store.lookup_pubkey(&hash), Some(key));
    }

    #[test]
    fn test_backup_rotation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = storage(&temp_dir, 3);

        for n in 0..5u64 {
            storage.save("counter.json", &n).unwrap();
        }

        assert_eq!(storage.list_backups("counter.json"), vec![0, 1, 2]);
        assert_eq!(storage.load::<u64>("counter.json").unwrap(), 4);
        assert_eq!(storage.restore_backup::<u64>("counter.json", 0).unwrap(), 3);
        assert_eq!(storage.restore_backup::<u64>("counter.json", 2).unwrap(), 1);
        assert!(storage.restore_backup::<u64>("counter.json", 3).is_err());
    }
}
