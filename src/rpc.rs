//! Chain collaborator interface
//!
//! The builder never talks to the network itself. Callers supply a
//! [`ChainClient`] whose methods perform one blocking round trip each and
//! hand back the node's JSON-RPC envelope.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TxError};
use crate::fixed8::Fixed8;
use crate::types::Hash256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse<T> {
    #[serde(default)]
    pub jsonrpc: String,
    #[serde(default)]
    pub id: serde_json::Value,
    pub result: Option<T>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

impl<T> RpcResponse<T> {
    pub fn ok(result: T) -> Self {
        RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: serde_json::Value::from(1),
            result: Some(result),
            error: None,
        }
    }

    pub fn err(code: i64, message: impl Into<String>) -> Self {
        RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: serde_json::Value::from(1),
            result: None,
            error: Some(RpcError { code, message: message.into() }),
        }
    }

    /// An error payload wins over any result; a missing result is malformed.
    pub fn into_result(self) -> Result<T> {
        if let Some(err) = self.error {
            return Err(TxError::Rpc { code: err.code, message: err.message });
        }
        self.result
            .ok_or_else(|| TxError::MalformedResponse("response has neither result nor error".to_string()))
    }
}

/// One unspent output of an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    #[serde(rename = "txid")]
    pub tx_id: Hash256,
    #[serde(rename = "n")]
    pub index: u16,
    pub value: Fixed8,
}

/// Unspent outputs of one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    #[serde(rename = "asset_hash")]
    pub asset_id: Hash256,
    #[serde(default)]
    pub unspent: Vec<UnspentOutput>,
}

impl Balance {
    pub fn total(&self) -> Result<Fixed8> {
        Fixed8::checked_sum(self.unspent.iter().map(|u| u.value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unspents {
    #[serde(default)]
    pub balance: Vec<Balance>,
    #[serde(default)]
    pub address: String,
}

impl Unspents {
    pub fn asset(&self, asset_id: &Hash256) -> Option<&Balance> {
        self.balance.iter().find(|b| b.asset_id == *asset_id)
    }
}

/// A spent governing-token output with unclaimed utility tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimableOutput {
    #[serde(rename = "txid")]
    pub tx_id: Hash256,
    #[serde(rename = "n")]
    pub index: u16,
    pub unclaimed: Fixed8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claimable {
    #[serde(default)]
    pub claimable: Vec<ClaimableOutput>,
    #[serde(default)]
    pub address: String,
}

/// Outcome of a read-only script simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvokeResult {
    pub state: String,
    pub gas_consumed: Fixed8,
    #[serde(default)]
    pub script: String,
    #[serde(default)]
    pub stack: Vec<serde_json::Value>,
}

impl InvokeResult {
    pub fn is_fault(&self) -> bool {
        self.state.contains("FAULT")
    }
}

/// Node access required by the transaction builder.
///
/// `Err` is a transport failure; an error payload inside an `Ok` envelope is
/// the node refusing the request. Both surface to the caller unchanged.
pub trait ChainClient {
    fn get_unspent_outputs(&self, address: &str) -> anyhow::Result<RpcResponse<Unspents>>;

    fn invoke_script(&self, script_hex: &str) -> anyhow::Result<RpcResponse<InvokeResult>>;

    fn get_claimable(&self, address: &str) -> anyhow::Result<RpcResponse<Claimable>>;

    fn send_raw_transaction(&self, raw_hex: &str) -> anyhow::Result<RpcResponse<bool>>;
}

impl<C: ChainClient + ?Sized> ChainClient for &C {
    fn get_unspent_outputs(&self, address: &str) -> anyhow::Result<RpcResponse<Unspents>> {
        (**self).get_unspent_outputs(address)
    }

    fn invoke_script(&self, script_hex: &str) -> anyhow::Result<RpcResponse<InvokeResult>> {
        (**self).invoke_script(script_hex)
    }

    fn get_claimable(&self, address: &str) -> anyhow::Result<RpcResponse<Claimable>> {
        (**self).get_claimable(address)
    }

    fn send_raw_transaction(&self, raw_hex: &str) -> anyhow::Result<RpcResponse<bool>> {
        (**self).send_raw_transaction(raw_hex)
    }
}

/// Collapse a collaborator call into the crate's error space.
pub fn unwrap_response<T>(response: anyhow::Result<RpcResponse<T>>) -> Result<T> {
    response?.into_result()
}
