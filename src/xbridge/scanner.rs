//! Trade ledger scan over recent blocks

use log::{debug, info, warn};

use crate::chain::{BlockWalk, ChainReader, DEFAULT_TIME_HORIZON};
use crate::xbridge::pair::{CurrencyPair, CurrencyPairDecoder, TradeDetails};

/// Which blocks and records a scan covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeWindow {
    /// At most this many blocks, counting unreadable ones
    pub max_blocks: Option<u32>,
    /// Seconds before the tip's time that blocks must be newer than
    pub time_horizon: i64,
    /// Report undecodable trades too
    pub include_errors: bool,
}

impl Default for TradeWindow {
    fn default() -> Self {
        Self {
            max_blocks: None,
            time_horizon: DEFAULT_TIME_HORIZON,
            include_errors: false,
        }
    }
}

/// One reported record
#[derive(Debug, Clone, PartialEq)]
pub enum TradeEntry {
    Trade {
        timestamp: i64,
        txid: String,
        details: TradeDetails,
    },
    Error {
        timestamp: i64,
        txid: String,
        message: String,
    },
}

impl TradeEntry {
    pub fn txid(&self) -> &str {
        match self {
            TradeEntry::Trade { txid, .. } | TradeEntry::Error { txid, .. } => txid,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            TradeEntry::Trade { timestamp, .. } | TradeEntry::Error { timestamp, .. } => {
                *timestamp
            }
        }
    }
}

/// Collects trade records, newest block first
pub struct TradeLedgerScanner<'a, C: ChainReader + ?Sized> {
    chain: &'a C,
    decoder: CurrencyPairDecoder<'a>,
}

impl<'a, C: ChainReader + ?Sized> TradeLedgerScanner<'a, C> {
    pub fn new(chain: &'a C, decoder: CurrencyPairDecoder<'a>) -> Self {
        Self { chain, decoder }
    }

    pub fn scan(&self, window: &TradeWindow) -> Vec<TradeEntry> {
        let mut entries = Vec::new();
        let mut scanned = 0usize;

        for block_ref in BlockWalk::from_tip(self.chain, window.time_horizon, window.max_blocks) {
            scanned += 1;
            let block = match self.chain.read_block(&block_ref) {
                Ok(block) => block,
                Err(e) => {
                    warn!(
                        "Skipping block {} at height {}: {}",
                        block_ref.hash, block_ref.height, e
                    );
                    continue;
                }
            };

            for tx in &block.transactions {
                match self.decoder.decode(tx) {
                    CurrencyPair::Empty => {}
                    CurrencyPair::Error(message) => {
                        if window.include_errors {
                            entries.push(TradeEntry::Error {
                                timestamp: block.time,
                                txid: tx.txid(),
                                message,
                            });
                        }
                    }
                    CurrencyPair::Valid(details) => {
                        debug!("trade {} in block {}", details.swap_id, block.hash);
                        entries.push(TradeEntry::Trade {
                            timestamp: block.time,
                            txid: tx.txid(),
                            details,
                        });
                    }
                }
            }
        }

        info!("Scanned {} blocks, found {} trade records", scanned, entries.len());
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MemoryChain, SECONDS_PER_DAY};
    use crate::core::{Base58Codec, Block, KeyHash, Transaction};
    use crate::xbridge::pair::tests::{trade_tx, valid_payload};

    /// Chain of `len` daily blocks; `txs(height)` fills each block
    fn chain_with(len: u64, txs: impl Fn(u64) -> Vec<Transaction>) -> MemoryChain {
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
                1_600_000_000 + n as i64 * SECONDS_PER_DAY,
                txs(n),
            );
            chain.push_block(block).unwrap();
        }
        chain
    }

    fn one_trade(_: u64) -> Vec<Transaction> {
        vec![trade_tx(&valid_payload(), Some(KeyHash([5; 20])))]
    }

    #[test]
    fn test_scan_newest_first_without_genesis() {
        let codec = Base58Codec::default();
        let chain = chain_with(4, one_trade);
        let scanner = TradeLedgerScanner::new(&chain, CurrencyPairDecoder::new(&codec));

        let entries = scanner.scan(&TradeWindow::default());
        let times: Vec<i64> = entries.iter().map(TradeEntry::timestamp).collect();
        let base = 1_600_000_000;
        assert_eq!(
            times,
            vec![
                base + 3 * SECONDS_PER_DAY,
                base + 2 * SECONDS_PER_DAY,
                base + SECONDS_PER_DAY
            ]
        );
    }

    #[test]
    fn test_scan_block_budget() {
        let codec = Base58Codec::default();
        let chain = chain_with(10, one_trade);
        let scanner = TradeLedgerScanner::new(&chain, CurrencyPairDecoder::new(&codec));

        let window = TradeWindow {
            max_blocks: Some(2),
            ..Default::default()
        };
        assert_eq!(scanner.scan(&window).len(), 2);
    }

    #[test]
    fn test_scan_skips_unreadable_blocks_within_budget() {
        let codec = Base58Codec::default();
        let mut chain = chain_with(6, one_trade);
        chain.prune(5);
        let scanner = TradeLedgerScanner::new(&chain, CurrencyPairDecoder::new(&codec));

        // the pruned tip uses one of the three blocks
        let window = TradeWindow {
            max_blocks: Some(3),
            ..Default::default()
        };
        let entries = scanner.scan(&window);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].timestamp(), 1_600_000_000 + 4 * SECONDS_PER_DAY);
    }

    #[test]
    fn test_scan_error_records_are_opt_in() {
        let codec = Base58Codec::default();
        let chain = chain_with(3, |_| {
            vec![
                trade_tx("[\"bad\"]", Some(KeyHash([5; 20]))),
                trade_tx(&valid_payload(), Some(KeyHash([5; 20]))),
            ]
        });
        let scanner = TradeLedgerScanner::new(&chain, CurrencyPairDecoder::new(&codec));

        let quiet = scanner.scan(&TradeWindow::default());
        assert_eq!(quiet.len(), 2);
        assert!(quiet.iter().all(|e| matches!(e, TradeEntry::Trade { .. })));

        let window = TradeWindow {
            include_errors: true,
            ..Default::default()
        };
        let loud = scanner.scan(&window);
        assert_eq!(loud.len(), 4);
        // block order, then transaction order
        assert!(matches!(loud[0], TradeEntry::Error { .. }));
        assert!(matches!(loud[1], TradeEntry::Trade { .. }));
        assert_eq!(loud[0].timestamp(), loud[1].timestamp());
    }

    #[test]
    fn test_scan_empty_chain() {
        let codec = Base58Codec::default();
        let chain = MemoryChain::new();
        let scanner = TradeLedgerScanner::new(&chain, CurrencyPairDecoder::new(&codec));
        assert!(scanner.scan(&TradeWindow::default()).is_empty());
    }
}
