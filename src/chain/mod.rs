//! Chain access
//!
//! - `ChainReader`: tip, parent links and block reads
//! - `MemoryChain`: in-memory chain loadable from a JSON snapshot
//! - `BlockWalk`: bounded newest-first traversal

pub mod memory;
pub mod reader;
pub mod walk;

pub use memory::{ChainFile, MemoryChain};
pub use reader::{BlockRef, ChainError, ChainReader};
pub use walk::{BlockWalk, DEFAULT_TIME_HORIZON, SECONDS_PER_DAY};
