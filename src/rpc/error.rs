//! RPC error codes and conversions from module errors

use serde_json::{json, Value};
use thiserror::Error;

use crate::message::MessageError;
use crate::multisig::{MultisigError, ResolveError};

pub const RPC_MISC_ERROR: i64 = -1;
pub const RPC_TYPE_ERROR: i64 = -3;
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;
pub const RPC_INVALID_PARAMETER: i64 = -8;
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;

/// A command failure with its numeric code
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::new(RPC_INVALID_PARAMETER, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(RPC_TYPE_ERROR, message)
    }

    /// JSON-RPC error object
    pub fn to_json(&self) -> Value {
        json!({
            "code": self.code,
            "message": self.message,
        })
    }
}

impl From<MultisigError> for RpcError {
    fn from(err: MultisigError) -> Self {
        let code = match &err {
            MultisigError::Resolve(ResolveError::InvalidKeyInput(_)) => {
                RPC_INVALID_ADDRESS_OR_KEY
            }
            MultisigError::Script(_) => RPC_MISC_ERROR,
            _ => RPC_INVALID_PARAMETER,
        };
        Self::new(code, err.to_string())
    }
}

impl From<MessageError> for RpcError {
    fn from(err: MessageError) -> Self {
        let code = match err {
            MessageError::InvalidAddress | MessageError::NotKeyAddress => RPC_TYPE_ERROR,
            MessageError::MalformedSignature => RPC_INVALID_ADDRESS_OR_KEY,
        };
        Self::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_error_codes() {
        assert_eq!(RpcError::from(MessageError::InvalidAddress).code, RPC_TYPE_ERROR);
        let err = RpcError::from(MessageError::MalformedSignature);
        assert_eq!(err.code, RPC_INVALID_ADDRESS_OR_KEY);
        assert_eq!(err.message, "Malformed base64 encoding");
    }

    #[test]
    fn test_multisig_error_codes() {
        let err = RpcError::from(MultisigError::NotEnoughKeys { got: 1, need: 2 });
        assert_eq!(err.code, RPC_INVALID_PARAMETER);
        assert_eq!(
            err.message,
            "not enough keys supplied (got 1 keys, but need at least 2 to redeem)"
        );
        let err = MultisigError::from(ResolveError::InvalidKeyInput("zz".into()));
        let err = RpcError::from(err);
        assert_eq!(err.code, RPC_INVALID_ADDRESS_OR_KEY);
        assert_eq!(err.to_json()["message"], "Invalid public key: zz");
    }
}
