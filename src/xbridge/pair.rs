//! Trade records carried in transaction outputs
//!
//! A trade transaction has a null-data output whose payload is a JSON array
//! `[swapId, fromCurrency, fromAmount, toCurrency, toAmount]`, and pays the
//! counterparty through a key output.

use log::debug;
use serde_json::Value;

use crate::core::{
    extract_destinations, solve, AddressCodec, ScriptClass, Transaction, TxOut,
};

/// Base units per coin
pub const XBRIDGE_COIN: u64 = 1_000_000;

/// Longest accepted currency ticker
pub const MAX_CURRENCY_LEN: usize = 8;

/// Hex length of a swap identifier
pub const SWAP_ID_LEN: usize = 64;

/// One side of a trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyAmount {
    pub currency: String,
    /// Amount in base units
    pub amount: u64,
}

impl CurrencyAmount {
    /// Amount in whole coins
    pub fn coins(&self) -> f64 {
        self.amount as f64 / XBRIDGE_COIN as f64
    }
}

/// A fully decoded trade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeDetails {
    pub swap_id: String,
    pub from: CurrencyAmount,
    pub to: CurrencyAmount,
    /// Encoded address of the counterparty's key output
    pub counterparty: String,
}

/// Classification of one transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencyPair {
    /// No trade pattern present
    Empty,
    /// Trade pattern present but undecodable
    Error(String),
    Valid(TradeDetails),
}

/// Decodes trade records from transaction outputs
#[derive(Clone, Copy)]
pub struct CurrencyPairDecoder<'a> {
    codec: &'a dyn AddressCodec,
}

impl<'a> CurrencyPairDecoder<'a> {
    pub fn new(codec: &'a dyn AddressCodec) -> Self {
        Self { codec }
    }

    pub fn decode(&self, tx: &Transaction) -> CurrencyPair {
        let (index, payload) = match find_payload(&tx.outputs) {
            Some(found) => found,
            None => return CurrencyPair::Empty,
        };

        let fields = match parse_fields(&payload) {
            Ok(fields) => fields,
            Err(message) => {
                debug!("undecodable trade payload: {}", message);
                return CurrencyPair::Error(message);
            }
        };

        match self.counterparty(&tx.outputs, index) {
            Some(counterparty) => CurrencyPair::Valid(TradeDetails {
                counterparty,
                ..fields
            }),
            None => CurrencyPair::Error("counterparty key not found".to_string()),
        }
    }

    /// First output other than the payload that pays to a key
    fn counterparty(&self, outputs: &[TxOut], payload_index: usize) -> Option<String> {
        outputs
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != payload_index)
            .find_map(|(_, out)| {
                let extracted = extract_destinations(&out.script_pubkey);
                match extracted.class {
                    ScriptClass::PubKey | ScriptClass::PubKeyHash => {
                        extracted.destinations.first().map(|d| self.codec.encode(d))
                    }
                    _ => None,
                }
            })
    }
}

/// Index and bytes of the first null-data push that opens a JSON array
fn find_payload(outputs: &[TxOut]) -> Option<(usize, Vec<u8>)> {
    outputs.iter().enumerate().find_map(|(i, out)| {
        let solution = solve(&out.script_pubkey);
        if solution.class != ScriptClass::NullData {
            return None;
        }
        let data = solution.items.into_iter().find(|item| !item.is_empty())?;
        (data.first() == Some(&b'[')).then_some((i, data))
    })
}

fn parse_fields(payload: &[u8]) -> Result<TradeDetails, String> {
    let values: Vec<Value> =
        serde_json::from_slice(payload).map_err(|e| format!("malformed trade data: {}", e))?;
    if values.len() != 5 {
        return Err(format!("expected 5 trade fields, got {}", values.len()));
    }

    Ok(TradeDetails {
        swap_id: parse_swap_id(&values[0])?,
        from: CurrencyAmount {
            currency: parse_currency(&values[1])?,
            amount: parse_amount(&values[2])?,
        },
        to: CurrencyAmount {
            currency: parse_currency(&values[3])?,
            amount: parse_amount(&values[4])?,
        },
        counterparty: String::new(),
    })
}

fn parse_swap_id(value: &Value) -> Result<String, String> {
    match value.as_str() {
        Some(id) if id.len() == SWAP_ID_LEN && id.bytes().all(|b| b.is_ascii_hexdigit()) => {
            Ok(id.to_string())
        }
        _ => Err(format!("invalid swap id {}", value)),
    }
}

fn parse_currency(value: &Value) -> Result<String, String> {
    match value.as_str() {
        Some(name)
            if (1..=MAX_CURRENCY_LEN).contains(&name.len())
                && name.bytes().all(|b| b.is_ascii_alphanumeric()) =>
        {
            Ok(name.to_string())
        }
        _ => Err(format!("invalid currency {}", value)),
    }
}

fn parse_amount(value: &Value) -> Result<u64, String> {
    value
        .as_u64()
        .ok_or_else(|| format!("invalid amount {}", value))
}
