//! Block implementation
//!
//! A block as returned from block storage: its hash, timestamp and the
//! transactions it carries.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::core::transaction::Transaction;

/// A block in the chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Block {
    /// Block hash (hex)
    pub hash: String,
    /// Hash of the parent block, empty for genesis
    #[serde(default)]
    pub previous_hash: String,
    /// Block time in unix seconds
    pub time: i64,
    /// List of transactions in the block
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn new(
        hash: String,
        previous_hash: String,
        time: i64,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            hash,
            previous_hash,
            time,
            transactions,
        }
    }

    /// Block time as a UTC datetime
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.time, 0).single()
    }

    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_timestamp() {
        let block = Block::new("aa".into(), String::new(), 1_600_000_000, vec![]);
        assert!(block.is_genesis());
        assert_eq!(
            block.timestamp().unwrap().format("%Y-%m-%d").to_string(),
            "2020-09-13"
        );
    }
}
