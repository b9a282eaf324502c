//! Standard JSON-RPC 2.0 error codes and small constructors for
//! [`crate::JsonRpcError`] values built from them.

use crate::JsonRpcError;
use serde_json::Value;

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i32 = -32700;
/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i32 = -32600;
/// The method does not exist or is not available.
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Invalid method parameter(s).
pub const INVALID_PARAMS: i32 = -32602;
/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i32 = -32603;
/// LSP-specific: a request other than `initialize`/`shutdown`/`exit`
/// arrived before `initialize` completed.
pub const SERVER_NOT_INITIALIZED: i32 = -32002;

/// Build a `Parse error` response body. `reason` should describe where and
/// why the JSON failed to parse (mirrors the original's
/// `"Error parsing JSON: <offset>(line=.., offs=..): <reason>"` messages).
pub fn parse_error(reason: impl Into<String>) -> JsonRpcError {
    JsonRpcError::with_data(PARSE_ERROR, "Parse error", Value::String(reason.into()))
}

/// Build an `Invalid request` response body: the message parsed as JSON but
/// is not a well-formed JSON-RPC 2.0 request/notification. Carries no
/// `data`, mirroring the original, which never attaches a reason here —
/// callers that want to explain the rejection log it to stderr instead.
pub fn invalid_request() -> JsonRpcError {
    JsonRpcError::new(INVALID_REQUEST, "Invalid request")
}

/// Build a `Method not found` response body for `method`.
pub fn method_not_found(method: &str) -> JsonRpcError {
    JsonRpcError::with_data(
        METHOD_NOT_FOUND,
        "Method not found",
        Value::String(method.to_string()),
    )
}

/// Build an `Invalid params` response body. `reason` names the offending
/// parameter and what was expected of it.
pub fn invalid_params(reason: impl Into<String>) -> JsonRpcError {
    JsonRpcError::with_data(INVALID_PARAMS, "Invalid params", Value::String(reason.into()))
}

/// Build an `Internal error` response body.
pub fn internal_error(reason: impl Into<String>) -> JsonRpcError {
    JsonRpcError::with_data(INTERNAL_ERROR, "Internal error", Value::String(reason.into()))
}

/// Build the LSP `Server not initialized` response body emitted for any
/// request other than `initialize`/`shutdown`/`exit` that arrives before
/// `initialize` has completed.
pub fn server_not_initialized() -> JsonRpcError {
    JsonRpcError::new(SERVER_NOT_INITIALIZED, "Server not initialized")
}
