//! Bounded backward walk over the chain index

use crate::chain::reader::{BlockRef, ChainReader};

/// Seconds in one day
pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// How far back from the tip's timestamp a walk may reach
pub const DEFAULT_TIME_HORIZON: i64 = 30 * SECONDS_PER_DAY;

/// Iterates from the tip towards genesis, newest first
///
/// A block is yielded only while it has a parent, its time is after
/// `tip.time - horizon`, and the block budget is not used up. Genesis is
/// therefore never yielded.
pub struct BlockWalk<'a, C: ChainReader + ?Sized> {
    reader: &'a C,
    next: Option<BlockRef>,
    earliest_time: i64,
    remaining: Option<u32>,
}

impl<'a, C: ChainReader + ?Sized> BlockWalk<'a, C> {
    /// Walk back from the current tip
    pub fn from_tip(reader: &'a C, horizon: i64, max_blocks: Option<u32>) -> Self {
        let next = reader.tip();
        let earliest_time = next
            .as_ref()
            .map(|tip| tip.time.saturating_sub(horizon))
            .unwrap_or(i64::MAX);
        Self {
            reader,
            next,
            earliest_time,
            remaining: max_blocks,
        }
    }
}

impl<'a, C: ChainReader + ?Sized> Iterator for BlockWalk<'a, C> {
    type Item = BlockRef;

    fn next(&mut self) -> Option<BlockRef> {
        if self.remaining == Some(0) {
            return None;
        }
        let current = self.next.take()?;
        if current.time <= self.earliest_time {
            return None;
        }
        let parent = self.reader.parent(&current)?;

        self.next = Some(parent);
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining -= 1;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::MemoryChain;
    use crate::core::Block;

    /// Chain with one block per `spacing` seconds, tip last
    fn chain(len: u64, spacing: i64) -> MemoryChain {
        let mut chain = MemoryChain::new();
        for n in 0..len {
            let previous_hash = if n == 0 {
                String::new()
            } else {
                format!("{:064x}", n - 1)
            };
            let block = Block::new(
                format!("{:064x}", n),
                previous_hash,
                n as i64 * spacing,
                vec![],
            );
            chain.push_block(block).unwrap();
        }
        chain
    }

    fn heights(walk: BlockWalk<'_, MemoryChain>) -> Vec<u64> {
        walk.map(|b| b.height).collect()
    }

    #[test]
    fn test_walk_stops_before_genesis() {
        let chain = chain(5, 60);
        let walk = BlockWalk::from_tip(&chain, DEFAULT_TIME_HORIZON, None);
        assert_eq!(heights(walk), vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_walk_respects_block_budget() {
        let chain = chain(10, 60);
        let walk = BlockWalk::from_tip(&chain, DEFAULT_TIME_HORIZON, Some(3));
        assert_eq!(heights(walk), vec![9, 8, 7]);
        let walk = BlockWalk::from_tip(&chain, DEFAULT_TIME_HORIZON, Some(0));
        assert!(heights(walk).is_empty());
    }

    #[test]
    fn test_walk_respects_time_horizon() {
        // One block per day: the horizon admits blocks strictly newer than tip - 30d
        let chain = chain(40, SECONDS_PER_DAY);
        let walked = heights(BlockWalk::from_tip(&chain, DEFAULT_TIME_HORIZON, None));
        assert_eq!(walked.first(), Some(&39));
        assert_eq!(walked.last(), Some(&10));
        assert_eq!(walked.len(), 30);
    }

    #[test]
    fn test_walk_on_empty_chain() {
        let chain = MemoryChain::new();
        assert!(heights(BlockWalk::from_tip(&chain, DEFAULT_TIME_HORIZON, None)).is_empty());
    }
}
