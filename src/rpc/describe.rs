//! Destination descriptions for `validateaddress`

use log::debug;
use serde_json::{json, Map, Value};

use crate::core::{
    extract_destinations, AddressCodec, Destination, KeyHash, ScriptClass, ScriptHash,
};
use crate::wallet::{IsMine, WalletKeyStore};

/// Describes what the wallet knows about a destination
pub struct DestinationDescriptor<'a> {
    codec: &'a dyn AddressCodec,
    wallet: &'a dyn WalletKeyStore,
}

impl<'a> DestinationDescriptor<'a> {
    pub fn new(codec: &'a dyn AddressCodec, wallet: &'a dyn WalletKeyStore) -> Self {
        Self { codec, wallet }
    }

    /// Fields describing `destination`, in output order
    pub fn describe(&self, destination: &Destination, mine: IsMine) -> Map<String, Value> {
        match destination {
            Destination::None => Map::new(),
            Destination::KeyHash(hash) => self.describe_key(hash, mine),
            Destination::ScriptHash(hash) => self.describe_script(hash),
        }
    }

    fn describe_key(&self, hash: &KeyHash, mine: IsMine) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("isscript".into(), json!(false));
        if mine == IsMine::SPENDABLE {
            if let Some(key) = self.wallet.lookup_pubkey(hash) {
                obj.insert("pubkey".into(), json!(key.to_hex()));
                obj.insert("iscompressed".into(), json!(key.is_compressed()));
            }
        }
        obj
    }

    fn describe_script(&self, hash: &ScriptHash) -> Map<String, Value> {
        let mut obj = Map::new();
        obj.insert("isscript".into(), json!(true));
        let script = match self.wallet.lookup_script(hash) {
            Some(script) => script,
            None => {
                debug!("script {:?} not held by wallet", hash);
                return obj;
            }
        };

        let extracted = extract_destinations(&script);
        let addresses: Vec<String> = extracted
            .destinations
            .iter()
            .map(|d| self.codec.encode(d))
            .collect();
        obj.insert("script".into(), json!(extracted.class.name()));
        obj.insert("hex".into(), json!(script.to_hex()));
        obj.insert("addresses".into(), json!(addresses));
        if extracted.class == ScriptClass::Multisig {
            obj.insert("sigsrequired".into(), json!(extracted.required));
        }
        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Base58Codec, Script};
    use crate::crypto::KeyPair;
    use crate::wallet::MemoryKeyStore;

    #[test]
    fn test_none_is_empty() {
        let codec = Base58Codec::default();
        let store = MemoryKeyStore::new();
        let descriptor = DestinationDescriptor::new(&codec, &store);
        assert!(descriptor.describe(&Destination::None, IsMine::NO).is_empty());
    }

    #[test]
    fn test_spendable_key_reports_pubkey() {
        let codec = Base58Codec::default();
        let mut store = MemoryKeyStore::new();
        let key = KeyPair::generate().pubkey();
        let hash = store.add_key(key.clone());
        let descriptor = DestinationDescriptor::new(&codec, &store);

        let obj = descriptor.describe(&Destination::KeyHash(hash), IsMine::SPENDABLE);
        let fields: Vec<&str> = obj.keys().map(String::as_str).collect();
        assert_eq!(fields, vec!["isscript", "pubkey", "iscompressed"]);
        assert_eq!(obj["pubkey"], key.to_hex());
        assert_eq!(obj["iscompressed"], true);

        let watched = descriptor.describe(&Destination::KeyHash(hash), IsMine::WATCH_ONLY);
        assert_eq!(Value::Object(watched), json!({"isscript": false}));
    }

    #[test]
    fn test_multisig_script_description() {
        let codec = Base58Codec::default();
        let mut store = MemoryKeyStore::new();
        let a = KeyPair::generate().pubkey();
        let b = KeyPair::generate().pubkey();
        let script = Script::multisig(1, &[a.clone(), b.clone()]).unwrap();
        let hash = store.add_script(script.clone());
        let descriptor = DestinationDescriptor::new(&codec, &store);

        let obj = descriptor.describe(&Destination::ScriptHash(hash), IsMine::WATCH_ONLY);
        assert_eq!(obj["isscript"], true);
        assert_eq!(obj["script"], "multisig");
        assert_eq!(obj["hex"], script.to_hex());
        assert_eq!(obj["sigsrequired"], 1);
        let expected = vec![
            codec.encode(&Destination::KeyHash(KeyHash(a.key_id()))),
            codec.encode(&Destination::KeyHash(KeyHash(b.key_id()))),
        ];
        assert_eq!(obj["addresses"], json!(expected));
    }

    #[test]
    fn test_non_multisig_script_has_no_sigsrequired() {
        let codec = Base58Codec::default();
        let mut store = MemoryKeyStore::new();
        let key = KeyPair::generate().pubkey();
        let hash = store.add_script(Script::p2pk(&key));
        let descriptor = DestinationDescriptor::new(&codec, &store);

        let obj = descriptor.describe(&Destination::ScriptHash(hash), IsMine::SPENDABLE);
        assert_eq!(obj["script"], "pubkey");
        assert!(!obj.contains_key("sigsrequired"));
    }

    #[test]
    fn test_unknown_script_only_flags_script() {
        let codec = Base58Codec::default();
        let store = MemoryKeyStore::new();
        let descriptor = DestinationDescriptor::new(&codec, &store);
        let obj = descriptor.describe(&Destination::ScriptHash(ScriptHash([8; 20])), IsMine::NO);
        assert_eq!(Value::Object(obj), json!({"isscript": true}));
    }
}
