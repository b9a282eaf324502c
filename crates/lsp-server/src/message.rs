//! Structural JSON-RPC 2.0 request/notification validation, run against a
//! raw [`serde_json::Value`] before any method-specific parameter parsing.
//!
//! Mirrors `json_rpc_parse_request_notification`'s four checks: `jsonrpc`
//! must equal `"2.0"` exactly, `method` must be a non-null string, `params`
//! (if present) must be an object or array, and `id` (if present) must be a
//! string or number.

use serde_json::Value;

/// A structurally valid JSON-RPC 2.0 request or notification.
#[derive(Debug)]
pub struct Message {
    /// `None` for a notification.
    pub id: Option<Value>,
    /// The method name.
    pub method: String,
    /// `params`, normalised to `None` when absent or JSON `null`.
    pub params: Option<Value>,
}

impl Message {
    /// A message with no `id` is a notification — it receives no response.
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// Best-effort extraction of a well-formed `id` from a value that failed
/// [`validate`] for some other reason. JSON-RPC 2.0 asks for the id to be
/// echoed back on an `Invalid request` error whenever it can be determined,
/// even though the overall message was malformed.
pub fn extract_id(value: &Value) -> Option<Value> {
    match value.get("id") {
        Some(v @ Value::String(_)) | Some(v @ Value::Number(_)) => Some(v.clone()),
        _ => None,
    }
}

/// Validate `value` as a JSON-RPC 2.0 request/notification.
pub fn validate(value: &Value) -> Result<Message, ()> {
    let obj = value.as_object().ok_or(())?;

    match obj.get("jsonrpc") {
        Some(Value::String(s)) if s == "2.0" => {}
        _ => return Err(()),
    }

    let method = match obj.get("method") {
        Some(Value::String(s)) => s.clone(),
        _ => return Err(()),
    };

    let params = match obj.get("params") {
        None | Some(Value::Null) => None,
        Some(v @ Value::Object(_)) | Some(v @ Value::Array(_)) => Some(v.clone()),
        Some(_) => return Err(()),
    };

    let id = match obj.get("id") {
        None | Some(Value::Null) => None,
        Some(v @ Value::String(_)) | Some(v @ Value::Number(_)) => Some(v.clone()),
        Some(_) => return Err(()),
    };

    Ok(Message { id, method, params })
}
