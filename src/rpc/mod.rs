//! RPC command layer
//!
//! - `commands`: validateaddress, createmultisig, verifymessage, gettradingdata
//! - `describe`: wallet descriptions of destinations
//! - `context`: shared state and method dispatch
//! - `error`: numeric error codes

pub mod commands;
pub mod context;
pub mod describe;
pub mod error;

pub use commands::{create_multisig, get_trading_data, validate_address, verify_message};
pub use context::{RpcContext, RPC_METHODS};
pub use describe::DestinationDescriptor;
pub use error::{
    RpcError, RPC_INVALID_ADDRESS_OR_KEY, RPC_INVALID_PARAMETER, RPC_METHOD_NOT_FOUND,
    RPC_MISC_ERROR, RPC_TYPE_ERROR,
};
