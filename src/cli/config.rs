//! Node configuration
//!
//! Read from `<data-dir>/config.json` when present; every field falls back
//! to its default.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::core::{Network, MAX_SCRIPT_SIZE};

/// Name of the configuration file inside the data directory
pub const CONFIG_FILE: &str = "config.json";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Address version bytes to use
    pub network: Network,
    /// Chain snapshot file name
    pub chain_file: String,
    /// Wallet snapshot file name
    pub wallet_file: String,
    /// Largest redeem script `createmultisig` will return
    pub redeem_script_limit: usize,
    /// Snapshot backups kept on save
    pub max_backups: usize,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            network: Network::Mainnet,
            chain_file: "chain.json".to_string(),
            wallet_file: "wallet.json".to_string(),
            redeem_script_limit: MAX_SCRIPT_SIZE,
            max_backups: 5,
        }
    }
}

impl NodeConfig {
    /// Load from the data directory, defaults if the file is absent
    pub fn load(data_dir: &Path) -> Result<Self, ConfigError> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let config: NodeConfig = serde_json::from_str(&fs::read_to_string(path)?)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.redeem_script_limit == 0 || self.redeem_script_limit > MAX_SCRIPT_SIZE {
            return Err(ConfigError::Invalid(format!(
                "redeem_script_limit must be in 1..={}",
                MAX_SCRIPT_SIZE
            )));
        }
        if self.chain_file.is_empty() || self.wallet_file.is_empty() {
            return Err(ConfigError::Invalid("snapshot file names must be set".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MAX_SCRIPT_ELEMENT_SIZE;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(NodeConfig::load(dir.path()).unwrap(), NodeConfig::default());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            format!(
                r#"{{"network": "testnet", "redeem_script_limit": {}}}"#,
                MAX_SCRIPT_ELEMENT_SIZE
            ),
        )
        .unwrap();

        let config = NodeConfig::load(dir.path()).unwrap();
        assert_eq!(config.network, Network::Testnet);
        assert_eq!(config.redeem_script_limit, MAX_SCRIPT_ELEMENT_SIZE);
        assert_eq!(config.chain_file, "chain.json");
    }

    #[test]
    fn test_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), r#"{"redeem_script_limit": 0}"#).unwrap();
        assert!(matches!(
            NodeConfig::load(dir.path()),
            Err(ConfigError::Invalid(_))
        ));

        fs::write(dir.path().join(CONFIG_FILE), r#"{"network": "moon"}"#).unwrap();
        assert!(matches!(NodeConfig::load(dir.path()), Err(ConfigError::Parse(_))));
    }
}
