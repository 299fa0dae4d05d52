//! Line-delimited JSON-RPC 2.0 envelope types (spec.md §4.8).
//!
//! Domain-level failures (a stage failing, an issue not being found) never
//! use the JSON-RPC `error` member: spec.md §4.8 puts `status`/`error`/`kind`
//! *inside* the result object instead, so a caller always gets a `result` to
//! parse. The JSON-RPC `error` member is reserved for protocol-level
//! problems — a line that isn't JSON, or a method name we don't expose.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub id: Value,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProtocolErrorBody>,
}

impl RpcResponse {
    #[must_use]
    pub fn success(id: Value, result: Value) -> Self {
        Self { jsonrpc: "2.0", id, result: Some(result), error: None }
    }

    #[must_use]
    pub fn protocol_error(id: Value, error: ProtocolError) -> Self {
        Self { jsonrpc: "2.0", id, result: None, error: Some(error.into()) }
    }
}

#[derive(Debug, Serialize)]
pub struct ProtocolErrorBody {
    pub code: i64,
    pub message: String,
}

/// Transport/framing failures, distinct from the domain errors a method
/// result may embed.
#[derive(Debug)]
pub enum ProtocolError {
    ParseError(String),
    MethodNotFound(String),
}

impl From<ProtocolError> for ProtocolErrorBody {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::ParseError(msg) => Self { code: -32700, message: format!("parse error: {msg}") },
            ProtocolError::MethodNotFound(method) => Self { code: -32601, message: format!("method not found: {method}") },
        }
    }
}

/// A `$/progress` notification (spec.md §4.8): advisory, never required for
/// correctness, never itself signaling completion.
#[derive(Debug, Serialize)]
pub struct ProgressNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: ProgressParams,
}

#[derive(Debug, Serialize)]
pub struct ProgressParams {
    pub id: Value,
    pub fraction: f64,
    pub stage: String,
}

impl ProgressNotification {
    #[must_use]
    pub fn new(id: Value, fraction: f64, stage: impl Into<String>) -> Self {
        Self { jsonrpc: "2.0", method: "$/progress", params: ProgressParams { id, fraction, stage: stage.into() } }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_response_omits_error_field() {
        let response = RpcResponse::success(Value::from(1), serde_json::json!({"status": "success"}));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["result"]["status"], "success");
    }

    #[test]
    fn protocol_error_omits_result_field() {
        let response = RpcResponse::protocol_error(Value::from(1), ProtocolError::MethodNotFound("bogus".to_string()));
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], -32601);
    }

    #[test]
    fn progress_notification_carries_no_id_field_at_top_level() {
        let note = ProgressNotification::new(Value::from(7), 0.5, "running");
        let json = serde_json::to_value(&note).unwrap();
        assert_eq!(json["method"], "$/progress");
        assert_eq!(json["params"]["id"], 7);
        assert_eq!(json["params"]["fraction"], 0.5);
    }
}
