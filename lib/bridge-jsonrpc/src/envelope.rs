//! JSON-RPC request and response envelopes

use bridge_core::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A JSON-RPC call
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub id: u64,
    pub method: &'a str,
    pub params: &'a [Value],
}

/// Error object of a JSON-RPC reply.
///
/// Bridges disagree on the message key: jabsorb uses `msg`, JSON-RPC 2.0
/// uses `message`.
#[derive(Debug, Default, Deserialize)]
pub struct RpcErrorObject {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A JSON-RPC reply
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Parse a reply body
    pub fn parse(body: &[u8]) -> Result<Self, TransportError> {
        serde_json::from_slice(body)
            .map_err(|e| TransportError::Protocol(format!("invalid JSON-RPC reply: {}", e)))
    }

    /// Extract the call result, turning an error object into a remote error
    pub fn into_result(self) -> Result<Value, TransportError> {
        match self.error {
            Some(error) => Err(TransportError::Remote {
                code: error.code,
                message: error
                    .msg
                    .or(error.message)
                    .unwrap_or_else(|| "unknown remote error".to_string()),
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}
