//! Failure taxonomy for a single RPC call. Each variant is a distinct outcome
//! so callers can tell "the peer said no" apart from "the peer said yes but
//! the payload was not what we expected" and from "we never heard back".

use serde_json::Value;
use thiserror::Error;

/// Transport-level failures. The RPC core surfaces these verbatim through
/// [`RpcError::Transport`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("transport circuit breaker is open")]
    CircuitOpen,

    #[error("request body of {size} bytes exceeds the {limit} byte limit")]
    RequestTooLarge { size: usize, limit: usize },

    #[error("response body exceeds the {limit} byte limit")]
    ResponseTooLarge { limit: usize },

    #[error("endpoint answered with HTTP {code}: {body}")]
    Status { code: u16, body: String },

    #[error("connection failed: {0}")]
    Connection(String),

    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

#[derive(Debug, Error)]
pub enum RpcError {
    /// The peer answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        code: i64,
        message: String,
        data: Option<Value>,
    },

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("response id {actual} does not match request id {expected}")]
    CorrelationMismatch { expected: u64, actual: u64 },

    /// The call succeeded but its result did not have the expected shape.
    #[error("failed to decode {method} result: {reason}")]
    Decode { method: String, reason: String },

    #[error("failed to serialize request: {0}")]
    Serialization(String),
}

impl RpcError {
    /// The peer-supplied error code, if this is an RPC-level failure.
    pub fn code(&self) -> Option<i64> {
        match self {
            RpcError::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }
}
