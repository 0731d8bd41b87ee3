//! JSON-RPC style envelopes used between agents
//!
//! Every agent call is a request envelope answered by a response envelope
//! carrying exactly one of `result` or `error`. The `id` is assigned by the
//! caller and echoed back for correlation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub mod client;
pub use client::RpcClient;

pub const JSONRPC_VERSION: &str = "2.0";

/// Reserved error codes
pub mod codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// Generation failed, reply unparseable or wrong shape
    pub const GENERATION_FAILED: i64 = -32000;
    /// Peer answered with something that is not a response envelope
    pub const MALFORMED_RESPONSE: i64 = -32002;
    /// Connection refused, timed out, DNS failure
    pub const TRANSPORT_FAILURE: i64 = -32003;
}

/// Tagged outcome of an agent call
pub type RpcOutcome = std::result::Result<Value, RpcError>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default = "empty_params")]
    pub params: Value,
    pub id: i64,
}

fn empty_params() -> Value {
    Value::Object(Default::default())
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: i64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
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

    pub fn method_not_found(method: &str) -> Self {
        Self::new(
            codes::METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        )
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::new(codes::GENERATION_FAILED, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(codes::MALFORMED_RESPONSE, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(codes::TRANSPORT_FAILURE, message)
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    pub id: i64,
}

impl RpcResponse {
    pub fn success(id: i64, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: i64, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }

    pub fn from_outcome(id: i64, outcome: RpcOutcome) -> Self {
        match outcome {
            Ok(result) => Self::success(id, result),
            Err(error) => Self::failure(id, error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Collapse into the tagged outcome. Both or neither of result/error
    /// present is reported as a malformed envelope.
    pub fn into_outcome(self) -> RpcOutcome {
        match (self.result, self.error) {
            (Some(result), None) => Ok(result),
            (None, Some(error)) => Err(error),
            (Some(_), Some(_)) => Err(RpcError::malformed(
                "Response envelope carries both result and error",
            )),
            (None, None) => Err(RpcError::malformed(
                "Response envelope carries neither result nor error",
            )),
        }
    }
}
