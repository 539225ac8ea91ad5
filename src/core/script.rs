//! Script encoding and classification
//!
//! Implements the Bitcoin-style byte encoding for output scripts: opcode
//! constants, data pushes, the standard templates (P2PKH, P2SH, bare
//! multisig, pay-to-pubkey, OP_RETURN data) and a solver that recognises
//! them again.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::destination::{Destination, KeyHash, ScriptHash};
use crate::crypto::{hash160, PubKey};

// =============================================================================
// Script Constants
// =============================================================================

/// Maximum size of any script accepted by the protocol
pub const MAX_SCRIPT_SIZE: usize = 10_000;

/// Maximum size of a single pushed element (bounds a spendable P2SH redeem script)
pub const MAX_SCRIPT_ELEMENT_SIZE: usize = 520;

/// Maximum number of keys in a bare multisig script
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 16;

pub const OP_0: u8 = 0x00;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_RETURN: u8 = 0x6a;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;

// =============================================================================
// Script Errors
// =============================================================================

/// Script-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Push extends past end of script at offset {0}")]
    TruncatedPush(usize),
    #[error("Small integer out of range: {0}")]
    InvalidSmallInt(usize),
    #[error("Invalid script hex")]
    InvalidHex,
}

// =============================================================================
// Script
// =============================================================================

/// An immutable script byte sequence, serialized as hex
#[derive(Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Script(Vec<u8>);

/// One parsed script element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Data push, including `OP_0` as an empty push
    Push(&'a [u8]),
    /// Any non-push opcode
    Op(u8),
}

impl Script {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, ScriptError> {
        hex::decode(s).map(Self).map_err(|_| ScriptError::InvalidHex)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// HASH160 of the script, the identifier behind its P2SH address
    pub fn script_hash(&self) -> ScriptHash {
        ScriptHash(hash160(&self.0))
    }

    /// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
    pub fn p2pkh(hash: &KeyHash) -> Self {
        ScriptBuilder::new()
            .push_opcode(OP_DUP)
            .push_opcode(OP_HASH160)
            .push_slice(&hash.0)
            .push_opcode(OP_EQUALVERIFY)
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    /// `OP_HASH160 <20> OP_EQUAL`
    pub fn p2sh(hash: &ScriptHash) -> Self {
        ScriptBuilder::new()
            .push_opcode(OP_HASH160)
            .push_slice(&hash.0)
            .push_opcode(OP_EQUAL)
            .into_script()
    }

    /// `<pubkey> OP_CHECKSIG`
    pub fn p2pk(key: &PubKey) -> Self {
        ScriptBuilder::new()
            .push_slice(key.as_bytes())
            .push_opcode(OP_CHECKSIG)
            .into_script()
    }

    /// `OP_m <key>... OP_n OP_CHECKMULTISIG`
    ///
    /// Counts must already be within 1..=16; bounds are enforced by the
    /// multisig builder, not here.
    pub fn multisig(required: usize, keys: &[PubKey]) -> Result<Self, ScriptError> {
        let mut builder = ScriptBuilder::new().push_small_int(required)?;
        for key in keys {
            builder = builder.push_slice(key.as_bytes());
        }
        Ok(builder
            .push_small_int(keys.len())?
            .push_opcode(OP_CHECKMULTISIG)
            .into_script())
    }

    /// `OP_RETURN <data>`
    pub fn null_data(data: &[u8]) -> Self {
        ScriptBuilder::new()
            .push_opcode(OP_RETURN)
            .push_slice(data)
            .into_script()
    }

    /// Iterate over the script's elements
    pub fn instructions(&self) -> Instructions<'_> {
        Instructions {
            data: &self.0,
            pos: 0,
        }
    }
}

impl fmt::Debug for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Script({})", self.to_hex())
    }
}

impl TryFrom<String> for Script {
    type Error = ScriptError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Script> for String {
    fn from(script: Script) -> Self {
        script.to_hex()
    }
}

/// Iterator over script elements; yields an error once on a truncated push
pub struct Instructions<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Instructions<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8], ScriptError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ScriptError::TruncatedPush(self.pos))?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_len(&mut self, width: usize) -> Result<usize, ScriptError> {
        let bytes = self.take(width)?;
        Ok(bytes
            .iter()
            .rev()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>, ScriptError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.data.len() {
            return None;
        }
        let opcode = self.data[self.pos];
        self.pos += 1;

        let len = match opcode {
            OP_0 => Ok(0),
            0x01..=0x4b => Ok(opcode as usize),
            OP_PUSHDATA1 => self.read_len(1),
            OP_PUSHDATA2 => self.read_len(2),
            OP_PUSHDATA4 => self.read_len(4),
            _ => return Some(Ok(Instruction::Op(opcode))),
        };
        let result = len.and_then(|len| self.take(len)).map(Instruction::Push);
        if result.is_err() {
            // stop after reporting the error
            self.pos = self.data.len();
        }
        Some(result)
    }
}

/// Incremental script construction with minimal push encoding
#[derive(Debug, Default)]
pub struct ScriptBuilder(Vec<u8>);

impl ScriptBuilder {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_opcode(mut self, opcode: u8) -> Self {
        self.0.push(opcode);
        self
    }

    /// Push 0..=16 as `OP_0`/`OP_1`..`OP_16`
    pub fn push_small_int(self, n: usize) -> Result<Self, ScriptError> {
        match n {
            0 => Ok(self.push_opcode(OP_0)),
            1..=16 => Ok(self.push_opcode(OP_1 + (n as u8) - 1)),
            _ => Err(ScriptError::InvalidSmallInt(n)),
        }
    }

    pub fn push_slice(mut self, data: &[u8]) -> Self {
        match data.len() {
            len @ 0..=0x4b => self.0.push(len as u8),
            len @ 0x4c..=0xff => {
                self.0.push(OP_PUSHDATA1);
                self.0.push(len as u8);
            }
            len @ 0x100..=0xffff => {
                self.0.push(OP_PUSHDATA2);
                self.0.extend_from_slice(&(len as u16).to_le_bytes());
            }
            len => {
                self.0.push(OP_PUSHDATA4);
                self.0.extend_from_slice(&(len as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
        self
    }

    pub fn into_script(self) -> Script {
        Script(self.0)
    }
}

/// Decode `OP_1`..`OP_16`
pub fn decode_small_int(opcode: u8) -> Option<usize> {
    match opcode {
        OP_1..=OP_16 => Some((opcode - OP_1 + 1) as usize),
        _ => None,
    }
}

// =============================================================================
// Script Classification
// =============================================================================

/// Standard output script templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptClass {
    NonStandard,
    PubKey,
    PubKeyHash,
    ScriptHash,
    Multisig,
    NullData,
}

impl ScriptClass {
    /// Name reported by `validateaddress`
    pub fn name(&self) -> &'static str {
        match self {
            ScriptClass::NonStandard => "nonstandard",
            ScriptClass::PubKey => "pubkey",
            ScriptClass::PubKeyHash => "pubkeyhash",
            ScriptClass::ScriptHash => "scripthash",
            ScriptClass::Multisig => "multisig",
            ScriptClass::NullData => "nulldata",
        }
    }
}

/// A classified script with the data items that define it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub class: ScriptClass,
    /// Key/hash pushes for key templates, pushed data for null-data scripts
    pub items: Vec<Vec<u8>>,
    /// Required signatures (multisig `m`, 1 for single-key templates)
    pub required: usize,
}

impl Solution {
    fn new(class: ScriptClass, items: Vec<Vec<u8>>, required: usize) -> Self {
        Self {
            class,
            items,
            required,
        }
    }
}

/// Match a script against the standard templates
pub fn solve(script: &Script) -> Solution {
    let bytes = script.as_bytes();

    if bytes.len() == 23 && bytes[0] == OP_HASH160 && bytes[1] == 20 && bytes[22] == OP_EQUAL {
        return Solution::new(ScriptClass::ScriptHash, vec![bytes[2..22].to_vec()], 1);
    }

    if bytes.len() == 25
        && bytes[0] == OP_DUP
        && bytes[1] == OP_HASH160
        && bytes[2] == 20
        && bytes[23] == OP_EQUALVERIFY
        && bytes[24] == OP_CHECKSIG
    {
        return Solution::new(ScriptClass::PubKeyHash, vec![bytes[3..23].to_vec()], 1);
    }

    let parsed: Result<Vec<Instruction<'_>>, ScriptError> = script.instructions().collect();
    let ops = match parsed {
        Ok(ops) => ops,
        Err(_) => return Solution::new(ScriptClass::NonStandard, Vec::new(), 0),
    };

    match ops.as_slice() {
        [Instruction::Op(OP_RETURN), rest @ ..]
            if rest.iter().all(|op| matches!(op, Instruction::Push(_))) =>
        {
            let items = rest
                .iter()
                .filter_map(|op| match op {
                    Instruction::Push(data) => Some(data.to_vec()),
                    Instruction::Op(_) => None,
                })
                .collect();
            Solution::new(ScriptClass::NullData, items, 0)
        }
        [Instruction::Push(key), Instruction::Op(OP_CHECKSIG)]
            if PubKey::from_slice(key).is_valid() =>
        {
            Solution::new(ScriptClass::PubKey, vec![key.to_vec()], 1)
        }
        [Instruction::Op(m), keys @ .., Instruction::Op(n), Instruction::Op(OP_CHECKMULTISIG)] => {
            solve_multisig(*m, keys, *n)
                .unwrap_or_else(|| Solution::new(ScriptClass::NonStandard, Vec::new(), 0))
        }
        _ => Solution::new(ScriptClass::NonStandard, Vec::new(), 0),
    }
}

fn solve_multisig(m: u8, keys: &[Instruction<'_>], n: u8) -> Option<Solution> {
    let required = decode_small_int(m)?;
    let total = decode_small_int(n)?;
    if keys.len() != total || required > total {
        return None;
    }
    let items = keys
        .iter()
        .map(|op| match op {
            Instruction::Push(key) if PubKey::from_slice(key).is_valid() => Some(key.to_vec()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Solution::new(ScriptClass::Multisig, items, required))
}

/// Destinations referenced by a script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedDestinations {
    pub class: ScriptClass,
    pub destinations: Vec<Destination>,
    pub required: usize,
}

/// Classify a script and list the addresses it pays to
///
/// Null-data and non-standard scripts yield no destinations.
pub fn extract_destinations(script: &Script) -> ExtractedDestinations {
    let solution = solve(script);
    let destinations = match solution.class {
        ScriptClass::PubKey | ScriptClass::Multisig => solution
            .items
            .iter()
            .map(|key| Destination::KeyHash(KeyHash(hash160(key))))
            .collect(),
        ScriptClass::PubKeyHash => solution
            .items
            .first()
            .and_then(|h| KeyHash::from_slice(h))
            .map(Destination::KeyHash)
            .into_iter()
            .collect(),
        ScriptClass::ScriptHash => solution
            .items
            .first()
            .and_then(|h| ScriptHash::from_slice(h))
            .map(Destination::ScriptHash)
            .into_iter()
            .collect(),
        ScriptClass::NullData | ScriptClass::NonStandard => Vec::new(),
    };
    ExtractedDestinations {
        class: solution.class,
        destinations,
        required: solution.required,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_p2pkh_roundtrip() {
        let hash = KeyHash([0x11; 20]);
        let script = Script::p2pkh(&hash);
        assert_eq!(script.len(), 25);

        let extracted = extract_destinations(&script);
        assert_eq!(extracted.class, ScriptClass::PubKeyHash);
        assert_eq!(extracted.destinations, vec![Destination::KeyHash(hash)]);
    }

    #[test]
    fn test_p2sh_roundtrip() {
        let hash = ScriptHash([0x22; 20]);
        let script = Script::p2sh(&hash);
        assert_eq!(script.len(), 23);
        assert_eq!(solve(&script).class, ScriptClass::ScriptHash);
        assert_eq!(
            extract_destinations(&script).destinations,
            vec![Destination::ScriptHash(hash)]
        );
    }

    #[test]
    fn test_multisig_layout() {
        let keys: Vec<PubKey> = (0..3).map(|_| KeyPair::generate().pubkey()).collect();
        let script = Script::multisig(2, &keys).unwrap();

        let bytes = script.as_bytes();
        assert_eq!(bytes[0], OP_1 + 1);
        assert_eq!(bytes[bytes.len() - 2], OP_1 + 2);
        assert_eq!(bytes[bytes.len() - 1], OP_CHECKMULTISIG);
        assert_eq!(script.len(), 1 + 3 * 34 + 1 + 1);

        let solution = solve(&script);
        assert_eq!(solution.class, ScriptClass::Multisig);
        assert_eq!(solution.required, 2);
        assert_eq!(solution.items.len(), 3);
        assert_eq!(solution.items[1], keys[1].as_bytes());
    }

    #[test]
    fn test_small_int_bounds() {
        assert!(ScriptBuilder::new().push_small_int(17).is_err());
        assert_eq!(decode_small_int(OP_16), Some(16));
        assert_eq!(decode_small_int(OP_0), None);
    }

    #[test]
    fn test_null_data() {
        let script = Script::null_data(b"payload");
        let solution = solve(&script);
        assert_eq!(solution.class, ScriptClass::NullData);
        assert_eq!(solution.items, vec![b"payload".to_vec()]);
        assert!(extract_destinations(&script).destinations.is_empty());
    }

    #[test]
    fn test_pushdata1_encoding() {
        let data = vec![0xAB; 100];
        let script = Script::null_data(&data);
        assert_eq!(script.as_bytes()[1], OP_PUSHDATA1);
        assert_eq!(script.as_bytes()[2], 100);

        let ops: Vec<_> = script.instructions().collect::<Result<_, _>>().unwrap();
        assert_eq!(ops, vec![Instruction::Op(OP_RETURN), Instruction::Push(&data)]);
    }

    #[test]
    fn test_truncated_push_is_nonstandard() {
        let script = Script::from_bytes(vec![OP_RETURN, 0x05, 0x01]);
        assert!(script.instructions().any(|op| op.is_err()));
        assert_eq!(solve(&script).class, ScriptClass::NonStandard);
    }

    #[test]
    fn test_pay_to_pubkey() {
        let key = KeyPair::generate().pubkey();
        let extracted = extract_destinations(&Script::p2pk(&key));
        assert_eq!(extracted.class, ScriptClass::PubKey);
        assert_eq!(
            extracted.destinations,
            vec![Destination::KeyHash(KeyHash(key.key_id()))]
        );
    }

    #[test]
    fn test_script_hex_serde() {
        let script = Script::null_data(b"x");
        let json = serde_json::to_string(&script).unwrap();
        assert_eq!(json, "\"6a0178\"");
        let back: Script = serde_json::from_str(&json).unwrap();
        assert_eq!(back, script);
    }
}
