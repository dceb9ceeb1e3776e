//! JSON-RPC envelope types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Node error code for an unknown transaction, address or key.
pub const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

/// Errors that can occur while talking to the node.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    /// Node endpoint could not be built from the configuration.
    #[error("Invalid RPC endpoint: {0}")]
    InvalidEndpoint(String),

    /// Connection or request failed before a response arrived.
    #[error("RPC transport error: {0}")]
    Transport(String),

    /// RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// Non-success HTTP status without a JSON-RPC error body.
    #[error("RPC HTTP status {status}: {body}")]
    Http { status: u16, body: String },

    /// The node answered with a JSON-RPC error object.
    #[error("Node error {code}: {message}")]
    Node { code: i64, message: String },

    /// Response body was not a JSON-RPC envelope.
    #[error("Malformed RPC response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Whether the node reported the referenced object as unknown.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RpcError::Node { code, .. } if *code == RPC_INVALID_ADDRESS_OR_KEY)
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

/// Outgoing JSON-RPC request.
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: String,
    pub method: &'a str,
    pub params: Value,
}

/// Incoming JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

/// Error object carried by a failed JSON-RPC response.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

/// Turn an HTTP status and body into the call result.
///
/// A JSON-RPC error object wins over the HTTP status: bitcoind-derived nodes
/// report most failures as HTTP 500 with an error body.
pub fn decode_response(status: u16, body: &str) -> RpcResult<Value> {
    let success = (200..300).contains(&status);
    match serde_json::from_str::<RpcResponse>(body) {
        Ok(RpcResponse { error: Some(err), .. }) => Err(RpcError::Node {
            code: err.code,
            message: err.message,
        }),
        Ok(response) if success => Ok(response.result),
        Err(e) if success => Err(RpcError::Decode(e.to_string())),
        _ => Err(RpcError::Http {
            status,
            body: truncate(body, 256),
        }),
    }
}

fn truncate(body: &str, max: usize) -> String {
    match body.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
