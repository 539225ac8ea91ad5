//! Multisig module
//!
//! Resolves key arguments to public keys and builds M-of-N redeem scripts
//! with their pay-to-script-hash addresses.

pub mod builder;
pub mod resolver;

pub use builder::{MultisigError, MultisigScriptBuilder, RedeemScript};
pub use resolver::{KeyResolver, ResolveError};
