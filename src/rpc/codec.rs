//! JSON-RPC 2.0 envelopes: request encoding and strict response decoding.
//!
//! Params are positional and already serialized by the caller; the result of
//! a successful response is handed back as a raw [`Value`] because only the
//! call site knows its expected shape.

use crate::rpc::error::RpcError;
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcRequest {
    jsonrpc: &'static str,
    pub id: u64,
    pub method: String,
    pub params: Vec<Value>,
}

impl RpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method: method.into(),
            params,
        }
    }

    pub fn to_json(&self) -> Value {
        serde_json::json!({
            "jsonrpc": JSONRPC_VERSION,
            "id": self.id,
            "method": self.method,
            "params": self.params,
        })
    }

    pub fn encode(&self) -> Result<Bytes, RpcError> {
        serde_json::to_vec(self)
            .map(Bytes::from)
            .map_err(|err| RpcError::Serialization(err.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RpcResponse {
    Success {
        id: u64,
        result: Value,
    },
    Failure {
        id: u64,
        code: i64,
        message: String,
        data: Option<Value>,
    },
}

impl RpcResponse {
    pub fn id(&self) -> u64 {
        match self {
            RpcResponse::Success { id, .. } | RpcResponse::Failure { id, .. } => *id,
        }
    }

    /// Collapses the envelope into the raw result or an [`RpcError::Rpc`].
    pub fn into_result(self) -> Result<Value, RpcError> {
        match self {
            RpcResponse::Success { result, .. } => Ok(result),
            RpcResponse::Failure {
                code,
                message,
                data,
                ..
            } => Err(RpcError::Rpc {
                code,
                message,
                data,
            }),
        }
    }
}

/// Serializes a single positional parameter.
pub fn to_param<P: Serialize + ?Sized>(param: &P) -> Result<Value, RpcError> {
    serde_json::to_value(param).map_err(|err| RpcError::Serialization(err.to_string()))
}

/// Decodes a raw response body for the request identified by `expected_id`.
///
/// Exactly one of `result` / `error` must be present. The id must echo the
/// request id; a `null` id is only tolerated on error responses, where
/// JSON-RPC 2.0 uses it for requests the peer could not parse.
pub fn decode_response(body: &[u8], expected_id: u64) -> Result<RpcResponse, RpcError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| RpcError::MalformedResponse(format!("invalid JSON: {err}")))?;

    let Value::Object(mut envelope) = value else {
        return Err(RpcError::MalformedResponse(
            "response is not a JSON object".into(),
        ));
    };

    if let Some(version) = envelope.get("jsonrpc") {
        if version.as_str() != Some(JSONRPC_VERSION) {
            return Err(RpcError::MalformedResponse(format!(
                "unsupported jsonrpc version {version}"
            )));
        }
    }

    let result = envelope.remove("result");
    let error = envelope.remove("error");

    let id = match envelope.get("id") {
        Some(Value::Null) if error.is_some() && result.is_none() => expected_id,
        Some(raw) => raw.as_u64().ok_or_else(|| {
            RpcError::MalformedResponse(format!("response id {raw} is not an unsigned integer"))
        })?,
        None => return Err(RpcError::MalformedResponse("response has no id".into())),
    };

    if id != expected_id {
        return Err(RpcError::CorrelationMismatch {
            expected: expected_id,
            actual: id,
        });
    }

    match (result, error) {
        (Some(_), Some(_)) => Err(RpcError::MalformedResponse(
            "response carries both result and error".into(),
        )),
        (None, None) => Err(RpcError::MalformedResponse(
            "response carries neither result nor error".into(),
        )),
        (Some(result), None) => Ok(RpcResponse::Success { id, result }),
        (None, Some(error)) => decode_error_object(id, error),
    }
}

fn decode_error_object(id: u64, error: Value) -> Result<RpcResponse, RpcError> {
    let Value::Object(mut object) = error else {
        return Err(RpcError::MalformedResponse(
            "error member is not an object".into(),
        ));
    };

    let code = object
        .get("code")
        .and_then(Value::as_i64)
        .ok_or_else(|| RpcError::MalformedResponse("error object has no integer code".into()))?;
    let message = match object.remove("message") {
        Some(Value::String(message)) => message,
        _ => {
            return Err(RpcError::MalformedResponse(
                "error object has no string message".into(),
            ))
        }
    };
    let data = object.remove("data");

    Ok(RpcResponse::Failure {
        id,
        code,
        message,
        data,
    })
}
