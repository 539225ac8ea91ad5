//! XBridge trade records
//!
//! Decoding of cross-chain trade records from transaction outputs and the
//! scan that collects them from recent blocks.

pub mod pair;
pub mod scanner;

pub use pair::{
    CurrencyAmount, CurrencyPair, CurrencyPairDecoder, TradeDetails, MAX_CURRENCY_LEN,
    XBRIDGE_COIN,
};
pub use scanner::{TradeEntry, TradeLedgerScanner, TradeWindow};
