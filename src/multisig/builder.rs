//! M-of-N redeem script construction

use log::{debug, info};
use thiserror::Error;

use crate::core::script::{decode_small_int, OP_CHECKMULTISIG};
use crate::core::{
    AddressCodec, Destination, Instruction, Script, ScriptError, ScriptHash,
    MAX_PUBKEYS_PER_MULTISIG, MAX_SCRIPT_SIZE,
};
use crate::crypto::PubKey;
use crate::multisig::resolver::{KeyResolver, ResolveError};

/// Multisig construction errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MultisigError {
    #[error("a multisignature address must require at least one key to redeem")]
    InsufficientRequirement,
    #[error("not enough keys supplied (got {got} keys, but need at least {need} to redeem)")]
    NotEnoughKeys { got: usize, need: usize },
    #[error("Number of addresses involved in the multisignature address creation > {0}")]
    TooManyKeys(usize),
    #[error("redeemScript exceeds size limit: {size} > {limit}")]
    ScriptTooLarge { size: usize, limit: usize },
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("Script encoding failed: {0}")]
    Script(#[from] ScriptError),
}

/// A built multisig redeem script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemScript {
    required: usize,
    keys: Vec<PubKey>,
    script: Script,
}

impl RedeemScript {
    pub fn required(&self) -> usize {
        self.required
    }

    pub fn keys(&self) -> &[PubKey] {
        &self.keys
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn script_hash(&self) -> ScriptHash {
        self.script.script_hash()
    }

    /// Pay-to-script-hash address of this script
    pub fn address(&self, codec: &dyn AddressCodec) -> String {
        codec.encode(&Destination::ScriptHash(self.script_hash()))
    }

    /// Parse a canonical `OP_m <keys> OP_n OP_CHECKMULTISIG` script
    pub fn decode(script: &Script) -> Option<RedeemScript> {
        let ops: Vec<Instruction<'_>> = script.instructions().collect::<Result<_, _>>().ok()?;
        let (first, rest) = ops.split_first()?;
        let (last, rest) = rest.split_last()?;
        let (count, pushes) = rest.split_last()?;

        let required = match first {
            Instruction::Op(op) => decode_small_int(*op)?,
            Instruction::Push(_) => return None,
        };
        let total = match count {
            Instruction::Op(op) => decode_small_int(*op)?,
            Instruction::Push(_) => return None,
        };
        if *last != Instruction::Op(OP_CHECKMULTISIG) || pushes.len() != total {
            return None;
        }
        if required == 0 || required > total {
            return None;
        }

        let keys = pushes
            .iter()
            .map(|op| match op {
                Instruction::Push(data) => Some(PubKey::from_slice(data)),
                Instruction::Op(_) => None,
            })
            .collect::<Option<Vec<_>>>()?;

        Some(RedeemScript {
            required,
            keys,
            script: script.clone(),
        })
    }
}

/// Builds redeem scripts from user key inputs
pub struct MultisigScriptBuilder<'a> {
    resolver: KeyResolver<'a>,
    size_limit: usize,
}

impl<'a> MultisigScriptBuilder<'a> {
    /// Builder limited to the protocol's maximum script size
    pub fn new(resolver: KeyResolver<'a>) -> Self {
        Self {
            resolver,
            size_limit: MAX_SCRIPT_SIZE,
        }
    }

    /// Use a different upper bound on the serialized script
    pub fn with_size_limit(mut self, limit: usize) -> Self {
        self.size_limit = limit;
        self
    }

    pub fn size_limit(&self) -> usize {
        self.size_limit
    }

    /// Build an `n_required`-of-`inputs.len()` redeem script
    ///
    /// Key order is preserved; reordering the inputs yields a different
    /// script and address.
    pub fn build<S: AsRef<str>>(
        &self,
        n_required: i64,
        inputs: &[S],
    ) -> Result<RedeemScript, MultisigError> {
        if n_required < 1 {
            return Err(MultisigError::InsufficientRequirement);
        }
        let required = n_required as usize;
        if inputs.len() < required {
            return Err(MultisigError::NotEnoughKeys {
                got: inputs.len(),
                need: required,
            });
        }
        if inputs.len() > MAX_PUBKEYS_PER_MULTISIG {
            return Err(MultisigError::TooManyKeys(MAX_PUBKEYS_PER_MULTISIG));
        }

        let keys = inputs
            .iter()
            .map(|input| self.resolver.resolve(input.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let script = Script::multisig(required, &keys)?;
        if script.len() > self.size_limit {
            return Err(MultisigError::ScriptTooLarge {
                size: script.len(),
                limit: self.size_limit,
            });
        }

        info!("Built {}-of-{} redeem script", required, keys.len());
        debug!("redeem script {}", script.to_hex());
        Ok(RedeemScript {
            required,
            keys,
            script,
        })
    }
}
