//! Query commands
//!
//! Each command takes its collaborators explicitly and returns the JSON
//! value reported to the caller.

use log::info;
use serde_json::{json, Map, Value};

use crate::chain::ChainReader;
use crate::core::AddressCodec;
use crate::message::SignatureVerifier;
use crate::multisig::{KeyResolver, MultisigScriptBuilder};
use crate::rpc::describe::DestinationDescriptor;
use crate::rpc::error::RpcError;
use crate::wallet::{IsMine, WalletKeyStore};
use crate::xbridge::{CurrencyPairDecoder, TradeEntry, TradeLedgerScanner, TradeWindow};

/// `validateaddress`: an invalid address yields exactly `{"isvalid": false}`;
/// `ismine` is always reported for a valid one
pub fn validate_address(
    codec: &dyn AddressCodec,
    wallet: Option<&dyn WalletKeyStore>,
    address: &str,
) -> Value {
    let destination = match codec.decode(address) {
        Some(destination) if destination.is_valid() => destination,
        _ => return json!({ "isvalid": false }),
    };

    let mut ret = Map::new();
    ret.insert("isvalid".into(), json!(true));
    ret.insert("address".into(), json!(codec.encode(&destination)));

    let mine = wallet
        .map(|wallet| wallet.is_mine(&destination))
        .unwrap_or(IsMine::NO);
    ret.insert("ismine".into(), json!(mine.contains(IsMine::SPENDABLE)));

    if let Some(wallet) = wallet {
        if mine != IsMine::NO {
            ret.insert("iswatchonly".into(), json!(mine.contains(IsMine::WATCH_ONLY)));
            ret.extend(DestinationDescriptor::new(codec, wallet).describe(&destination, mine));
        }
        if let Some(label) = wallet.account(&destination) {
            ret.insert("account".into(), json!(label));
        }
    }
    Value::Object(ret)
}

/// `createmultisig`: `{"address", "redeemScript"}`
pub fn create_multisig<S: AsRef<str>>(
    codec: &dyn AddressCodec,
    wallet: Option<&dyn WalletKeyStore>,
    size_limit: usize,
    n_required: i64,
    keys: &[S],
) -> Result<Value, RpcError> {
    let builder =
        MultisigScriptBuilder::new(KeyResolver::new(codec, wallet)).with_size_limit(size_limit);
    let redeem = builder.build(n_required, keys)?;
    Ok(json!({
        "address": redeem.address(codec),
        "redeemScript": redeem.script().to_hex(),
    }))
}

/// `verifymessage`: `true` only when the signature recovers to the address
pub fn verify_message(
    codec: &dyn AddressCodec,
    address: &str,
    signature: &str,
    message: &str,
) -> Result<Value, RpcError> {
    let verified = SignatureVerifier::new(codec).verify(address, signature, message)?;
    Ok(Value::Bool(verified))
}

/// `gettradingdata`: trade records from recent blocks, newest first
pub fn get_trading_data<C: ChainReader + ?Sized>(
    chain: &C,
    codec: &dyn AddressCodec,
    window: &TradeWindow,
) -> Value {
    info!(
        "Scanning trades (blocks: {:?}, errors: {})",
        window.max_blocks, window.include_errors
    );
    let scanner = TradeLedgerScanner::new(chain, CurrencyPairDecoder::new(codec));
    Value::Array(scanner.scan(window).iter().map(trade_entry_json).collect())
}

fn trade_entry_json(entry: &TradeEntry) -> Value {
    match entry {
        TradeEntry::Trade {
            timestamp,
            txid,
            details,
        } => json!({
            "timestamp": timestamp,
            "txid": txid,
            "to": details.counterparty,
            "xid": details.swap_id,
            "from": details.from.currency,
            "fromAmount": details.from.coins(),
            "toCurrency": details.to.currency,
            "toAmount": details.to.coins(),
        }),
        TradeEntry::Error {
            timestamp,
            txid,
            message,
        } => json!({
            "timestamp": timestamp,
            "txid": txid,
            "xid": message,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{MemoryChain, SECONDS_PER_DAY};
    use crate::core::{Base58Codec, Block, Destination, KeyHash, Script, MAX_SCRIPT_SIZE};
    use crate::crypto::KeyPair;
    use crate::message::sign_message_base64;
    use crate::rpc::error::{RPC_INVALID_ADDRESS_OR_KEY, RPC_INVALID_PARAMETER, RPC_TYPE_ERROR};
    use crate::wallet::MemoryKeyStore;
    use crate::xbridge::pair::tests::{trade_tx, valid_payload, SWAP_ID};

    fn field_names(value: &Value) -> Vec<&str> {
        value
            .as_object()
            .map(|obj| obj.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_validate_invalid_address() {
        let codec = Base58Codec::default();
        let store = MemoryKeyStore::new();
        assert_eq!(
            validate_address(&codec, Some(&store), "garbage"),
            json!({ "isvalid": false })
        );
        assert_eq!(validate_address(&codec, None, ""), json!({ "isvalid": false }));
    }

    #[test]
    fn test_validate_foreign_address() {
        let codec = Base58Codec::default();
        let store = MemoryKeyStore::new();
        let address = codec.encode(&Destination::KeyHash(KeyHash([1; 20])));

        let ret = validate_address(&codec, Some(&store), &address);
        assert_eq!(field_names(&ret), vec!["isvalid", "address", "ismine"]);
        assert_eq!(ret["ismine"], false);

        // without a wallet nothing is mine
        let ret = validate_address(&codec, None, &address);
        assert_eq!(field_names(&ret), vec!["isvalid", "address", "ismine"]);
        assert_eq!(ret["ismine"], false);
    }

    #[test]
    fn test_validate_own_key_address() {
        let codec = Base58Codec::default();
        let mut store = MemoryKeyStore::new();
        let key = KeyPair::generate().pubkey();
        let hash = store.add_key(key.clone());
        store.set_label(Destination::KeyHash(hash), "main");
        let address = codec.encode(&Destination::KeyHash(hash));

        let ret = validate_address(&codec, Some(&store), &address);
        assert_eq!(
            field_names(&ret),
            vec![
                "isvalid",
                "address",
                "ismine",
                "iswatchonly",
                "isscript",
                "pubkey",
                "iscompressed",
                "account"
            ]
        );
        assert_eq!(ret["ismine"], true);
        assert_eq!(ret["iswatchonly"], false);
        assert_eq!(ret["pubkey"], key.to_hex());
        assert_eq!(ret["account"], "main");
    }

    #[test]
    fn test_validate_script_address() {
        let codec = Base58Codec::default();
        let mut store = MemoryKeyStore::new();
        let key = KeyPair::generate().pubkey();
        store.add_key(key.clone());
        let hash = store.add_script(Script::multisig(1, &[key]).unwrap());
        let address = codec.encode(&Destination::ScriptHash(hash));

        let ret = validate_address(&codec, Some(&store), &address);
        assert_eq!(ret["ismine"], true);
        assert_eq!(ret["isscript"], true);
        assert_eq!(ret["script"], "multisig");
        assert_eq!(ret["sigsrequired"], 1);
    }

    #[test]
    fn test_create_multisig_output() {
        let codec = Base58Codec::default();
        let keys: Vec<String> = (0..2).map(|_| KeyPair::generate().public_key_hex()).collect();

        let ret = create_multisig(&codec, None, MAX_SCRIPT_SIZE, 2, &keys).unwrap();
        assert_eq!(field_names(&ret), vec!["address", "redeemScript"]);
        let address = ret["address"].as_str().unwrap();
        assert!(matches!(codec.decode(address), Some(Destination::ScriptHash(_))));

        let err = create_multisig(&codec, None, MAX_SCRIPT_SIZE, 0, &keys).unwrap_err();
        assert_eq!(err.code, RPC_INVALID_PARAMETER);
        let err = create_multisig(&codec, None, MAX_SCRIPT_SIZE, 1, &["zz"]).unwrap_err();
        assert_eq!(err.code, RPC_INVALID_ADDRESS_OR_KEY);
    }

    #[test]
    fn test_verify_message_command() {
        let codec = Base58Codec::default();
        let key = KeyPair::generate();
        let address = codec.encode(&Destination::KeyHash(KeyHash(key.key_id())));
        let sig = sign_message_base64(&key, "ping").unwrap();

        assert_eq!(verify_message(&codec, &address, &sig, "ping"), Ok(json!(true)));
        assert_eq!(verify_message(&codec, &address, &sig, "pong"), Ok(json!(false)));
        assert_eq!(
            verify_message(&codec, "nope", &sig, "ping").unwrap_err().code,
            RPC_TYPE_ERROR
        );
    }

    #[test]
    fn test_trading_data_records() {
        let codec = Base58Codec::default();
        let mut chain = MemoryChain::new();
        chain
            .push_block(Block::new("00".into(), String::new(), 1_000, vec![]))
            .unwrap();
        let txs = vec![
            trade_tx(&valid_payload(), Some(KeyHash([6; 20]))),
            trade_tx("[1,2]", Some(KeyHash([6; 20]))),
        ];
        let time = 1_000 + SECONDS_PER_DAY;
        chain
            .push_block(Block::new("01".into(), "00".into(), time, txs.clone()))
            .unwrap();

        let window = TradeWindow {
            include_errors: true,
            ..Default::default()
        };
        let records = get_trading_data(&chain, &codec, &window);
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(
            field_names(&records[0]),
            vec![
                "timestamp",
                "txid",
                "to",
                "xid",
                "from",
                "fromAmount",
                "toCurrency",
                "toAmount"
            ]
        );
        assert_eq!(records[0]["timestamp"], time);
        assert_eq!(records[0]["txid"], txs[0].txid());
        assert_eq!(records[0]["to"], codec.encode(&Destination::KeyHash(KeyHash([6; 20]))));
        assert_eq!(records[0]["xid"], SWAP_ID);
        assert_eq!(records[0]["fromAmount"], 1.5);

        assert_eq!(field_names(&records[1]), vec!["timestamp", "txid", "xid"]);
        assert_eq!(records[1]["txid"], txs[1].txid());
    }
}
