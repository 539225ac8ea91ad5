//! Read access to chain state
//!
//! Block references come from the chain index and carry their timestamp, so
//! walking the chain needs no block reads; bodies are read separately and
//! that read may fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Block;

/// Chain read errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("Block not found: {0}")]
    BlockNotFound(String),
    #[error("Block data unavailable at height {0}")]
    BlockUnavailable(u64),
    #[error("Block {hash} does not extend tip {tip}")]
    Disconnected { hash: String, tip: String },
}

/// An entry in the chain index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRef {
    pub height: u64,
    pub hash: String,
    /// Block time in unix seconds
    pub time: i64,
}

/// A point-in-time view of the active chain
pub trait ChainReader {
    /// The active chain tip, `None` for an empty chain
    fn tip(&self) -> Option<BlockRef>;

    /// The block's parent, `None` for genesis
    fn parent(&self, block: &BlockRef) -> Option<BlockRef>;

    /// Read the block body from storage
    fn read_block(&self, block: &BlockRef) -> Result<Block, ChainError>;
}
