//! Command dispatch
//!
//! `RpcContext` owns shared handles to node state and maps method names to
//! the query commands, checking parameter count and JSON types on the way.

use log::{debug, info};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock};

use crate::chain::ChainReader;
use crate::core::{AddressCodec, MAX_SCRIPT_SIZE};
use crate::rpc::commands;
use crate::rpc::error::{RpcError, RPC_METHOD_NOT_FOUND};
use crate::wallet::WalletKeyStore;
use crate::xbridge::TradeWindow;

/// Methods served by [`RpcContext::call`]
pub const RPC_METHODS: &[&str] = &[
    "createmultisig",
    "gettradingdata",
    "help",
    "validateaddress",
    "verifymessage",
];

/// Shared state behind the query commands
pub struct RpcContext<C: ChainReader> {
    codec: Arc<dyn AddressCodec>,
    chain: Arc<RwLock<C>>,
    wallet: Option<Arc<dyn WalletKeyStore>>,
    script_size_limit: usize,
}

impl<C: ChainReader> RpcContext<C> {
    pub fn new(codec: Arc<dyn AddressCodec>, chain: Arc<RwLock<C>>) -> Self {
        Self {
            codec,
            chain,
            wallet: None,
            script_size_limit: MAX_SCRIPT_SIZE,
        }
    }

    /// Attach a wallet; pass a `RwLock`-wrapped store to lock per lookup
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletKeyStore>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    pub fn with_script_size_limit(mut self, limit: usize) -> Self {
        self.script_size_limit = limit;
        self
    }

    fn wallet(&self) -> Option<&dyn WalletKeyStore> {
        self.wallet.as_deref()
    }

    /// Run `method` with positional JSON parameters
    pub fn call(&self, method: &str, params: &[Value]) -> Result<Value, RpcError> {
        debug!("rpc call {} with {} params", method, params.len());
        match method {
            "validateaddress" => self.validateaddress(params),
            "createmultisig" => self.createmultisig(params),
            "verifymessage" => self.verifymessage(params),
            "gettradingdata" => self.gettradingdata(params),
            "help" => Ok(Value::from(RPC_METHODS.join("\n"))),
            _ => Err(RpcError::new(RPC_METHOD_NOT_FOUND, "Method not found")),
        }
    }

    fn validateaddress(&self, params: &[Value]) -> Result<Value, RpcError> {
        expect_params("validateaddress", params, 1, 1)?;
        let address = param_str(&params[0], "address")?;
        Ok(commands::validate_address(
            self.codec.as_ref(),
            self.wallet(),
            address,
        ))
    }

    fn createmultisig(&self, params: &[Value]) -> Result<Value, RpcError> {
        expect_params("createmultisig", params, 2, 2)?;
        let n_required = params[0]
            .as_i64()
            .ok_or_else(|| RpcError::type_error("nrequired must be an integer"))?;
        let keys = params[1]
            .as_array()
            .ok_or_else(|| RpcError::type_error("keys must be a json array of strings"))?
            .iter()
            .map(|key| param_str(key, "key"))
            .collect::<Result<Vec<_>, _>>()?;

        info!("createmultisig {} of {}", n_required, keys.len());
        commands::create_multisig(
            self.codec.as_ref(),
            self.wallet(),
            self.script_size_limit,
            n_required,
            &keys,
        )
    }

    fn verifymessage(&self, params: &[Value]) -> Result<Value, RpcError> {
        expect_params("verifymessage", params, 3, 3)?;
        let address = param_str(&params[0], "address")?;
        let signature = param_str(&params[1], "signature")?;
        let message = param_str(&params[2], "message")?;
        commands::verify_message(self.codec.as_ref(), address, signature, message)
    }

    fn gettradingdata(&self, params: &[Value]) -> Result<Value, RpcError> {
        expect_params("gettradingdata", params, 0, 2)?;
        let mut window = TradeWindow::default();
        if let Some(blocks) = params.first() {
            let blocks = blocks
                .as_i64()
                .ok_or_else(|| RpcError::type_error("blocks must be an integer"))?;
            if blocks < 0 {
                return Err(RpcError::invalid_parameter("blocks must not be negative"));
            }
            window.max_blocks = Some(u32::try_from(blocks).unwrap_or(u32::MAX));
        }
        if let Some(errors) = params.get(1) {
            window.include_errors = errors
                .as_bool()
                .ok_or_else(|| RpcError::type_error("errors must be a boolean"))?;
        }

        let chain = self.chain.read().unwrap_or_else(PoisonError::into_inner);
        Ok(commands::get_trading_data(&*chain, self.codec.as_ref(), &window))
    }
}

fn expect_params(
    method: &str,
    params: &[Value],
    min: usize,
    max: usize,
) -> Result<(), RpcError> {
    if params.len() < min || params.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(RpcError::invalid_parameter(format!(
            "{} expects {} parameters, got {}",
            method,
            expected,
            params.len()
        )));
    }
    Ok(())
}

fn param_str<'v>(value: &'v Value, label: &str) -> Result<&'v str, RpcError> {
    value
        .as_str()
        .ok_or_else(|| RpcError::type_error(format!("{} must be a string", label)))
}
