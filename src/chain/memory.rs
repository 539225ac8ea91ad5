//! In-memory chain
//!
//! Holds the active chain as a height-indexed list of blocks. Heights listed
//! as pruned keep their index entry but have no readable body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::chain::reader::{BlockRef, ChainError, ChainReader};
use crate::core::Block;

/// The active chain held in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryChain {
    blocks: Vec<Block>,
    pruned: BTreeSet<u64>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a block on top of the current tip
    pub fn push_block(&mut self, block: Block) -> Result<BlockRef, ChainError> {
        if let Some(tip) = self.blocks.last() {
            if block.previous_hash != tip.hash {
                return Err(ChainError::Disconnected {
                    hash: block.hash,
                    tip: tip.hash.clone(),
                });
            }
        }
        let height = self.blocks.len() as u64;
        let block_ref = Self::block_ref(height, &block);
        self.blocks.push(block);
        Ok(block_ref)
    }

    /// Drop the body of the block at `height`, keeping its index entry
    pub fn prune(&mut self, height: u64) {
        self.pruned.insert(height);
    }

    /// Height of the tip, `None` for an empty chain
    pub fn height(&self) -> Option<u64> {
        self.blocks.len().checked_sub(1).map(|h| h as u64)
    }

    pub fn get_block(&self, height: u64) -> Option<&Block> {
        self.blocks.get(height as usize)
    }

    fn block_ref(height: u64, block: &Block) -> BlockRef {
        BlockRef {
            height,
            hash: block.hash.clone(),
            time: block.time,
        }
    }

    /// Build from a snapshot, checking parent links
    pub fn from_file(file: ChainFile) -> Result<Self, ChainError> {
        let mut chain = Self::new();
        for block in file.blocks {
            chain.push_block(block)?;
        }
        for height in file.pruned {
            chain.prune(height);
        }
        Ok(chain)
    }

    pub fn to_file(&self) -> ChainFile {
        ChainFile {
            blocks: self.blocks.clone(),
            pruned: self.pruned.iter().copied().collect(),
        }
    }
}

impl ChainReader for MemoryChain {
    fn tip(&self) -> Option<BlockRef> {
        let height = self.height()?;
        self.blocks
            .last()
            .map(|block| Self::block_ref(height, block))
    }

    fn parent(&self, block: &BlockRef) -> Option<BlockRef> {
        let height = block.height.checked_sub(1)?;
        self.get_block(height)
            .map(|parent| Self::block_ref(height, parent))
    }

    fn read_block(&self, block: &BlockRef) -> Result<Block, ChainError> {
        if self.pruned.contains(&block.height) {
            return Err(ChainError::BlockUnavailable(block.height));
        }
        self.get_block(block.height)
            .filter(|stored| stored.hash == block.hash)
            .cloned()
            .ok_or_else(|| ChainError::BlockNotFound(block.hash.clone()))
    }
}

/// JSON form of a chain, as kept in the data directory
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainFile {
    /// Blocks from genesis to tip
    pub blocks: Vec<Block>,
    /// Heights whose block bodies are missing
    #[serde(default)]
    pub pruned: Vec<u64>,
}
