//! Method routing and request/notification handlers.
//!
//! Grounded in `language_server.c`'s `server_initialize` /
//! `server_shutdown` / `language_server_evaluate`, adapted to return
//! `Result` instead of writing a response and falling through (the
//! original's `server_shutdown` is missing a `return` after its
//! invalid-params check and would emit two responses for one request on an
//! uninitialised shutdown; this rewrite stops at the first error).

use std::process;

use nix::sys::signal::kill;
use nix::unistd::Pid;
use serde_json::Value;

use xatslsp_document_store::{DocumentStore, Edit};
use xatslsp_protocol::{
    capabilities, invalid_params, method_not_found, methods, server_not_initialized, JsonRpcError,
};

/// Process-wide server state: lifecycle flags and the document store.
/// Generic over nothing — the output sink lives on [`crate::LspServer`],
/// which wraps this.
pub(crate) struct State {
    pub(crate) initialized: bool,
    pub(crate) shutdown_requested: bool,
    pub(crate) documents: DocumentStore,
}

impl State {
    pub(crate) fn new() -> Self {
        State { initialized: false, shutdown_requested: false, documents: DocumentStore::new() }
    }

    /// Route one validated message to its handler. `None -> None` for a
    /// successful notification; `Some(value)` is the request's `result`.
    pub(crate) fn route(&mut self, method: &str, params: Option<Value>, is_notification: bool) -> Result<Option<Value>, JsonRpcError> {
        match method {
            methods::INITIALIZE => self.handle_initialize(params),
            methods::INITIALIZED => Ok(None),
            methods::SHUTDOWN => self.handle_shutdown(),
            methods::TEXT_DOCUMENT_DID_OPEN => self.handle_did_open(params).map(|()| None),
            methods::TEXT_DOCUMENT_DID_CHANGE => self.handle_did_change(params).map(|()| None),
            methods::TEXT_DOCUMENT_DID_CLOSE => self.handle_did_close(params).map(|()| None),
            methods::TEXT_DOCUMENT_DID_SAVE => self.handle_did_save(params).map(|()| None),
            methods::CANCEL_REQUEST => Ok(None),
            other => {
                if is_notification {
                    eprintln!("xatslsp: dropping unknown notification '{other}'");
                    Ok(None)
                } else {
                    Err(method_not_found(other))
                }
            }
        }
    }

    /// `exit`: terminate the process immediately, status `0` if a prior
    /// `shutdown` was handled, else `1`. Never returns.
    pub(crate) fn handle_exit(&self) -> ! {
        let code = if self.shutdown_requested { 0 } else { 1 };
        eprintln!("xatslsp: exit (shutdown_requested={}), exiting with status {code}", self.shutdown_requested);
        process::exit(code);
    }

    fn handle_initialize(&mut self, params: Option<Value>) -> Result<Option<Value>, JsonRpcError> {
        if self.initialized {
            return Err(invalid_params("server already initialized"));
        }

        let params = params
            .filter(|v| v.is_object())
            .ok_or_else(|| invalid_params("the parameter '/params' is missing or not an object; should be InitializeParams"))?;

        let process_id = match params.get("processId") {
            None | Some(Value::Null) => None,
            Some(Value::Number(n)) => n.as_i64(),
            Some(_) => {
                return Err(invalid_params(
                    "the parameter '/params/processId' is of mismatched type; should be number (parent process id)",
                ));
            }
        };

        match params.get("rootUri") {
            None | Some(Value::Null) | Some(Value::String(_)) => {}
            Some(_) => {
                return Err(invalid_params("the parameter '/params/rootUri' is of mismatched type; should be Document URI"));
            }
        }

        match params.get("trace") {
            None => {}
            Some(Value::String(s)) if s == "off" || s == "messages" || s == "verbose" => {}
            Some(_) => {
                return Err(invalid_params("trace should be one of \"off\", \"messages\", \"verbose\""));
            }
        }

        if let Some(pid) = process_id {
            if pid > 0 && !is_process_running(pid) {
                eprintln!("xatslsp: parent process {pid} is no longer running, exiting");
                process::exit(1);
            }
        }

        self.initialized = true;
        Ok(Some(capabilities::initialize_result()))
    }

    fn handle_shutdown(&mut self) -> Result<Option<Value>, JsonRpcError> {
        if !self.initialized {
            return Err(invalid_params("server already uninitialized"));
        }
        self.documents.free();
        self.shutdown_requested = true;
        Ok(Some(Value::Null))
    }

    fn handle_did_open(&mut self, params: Option<Value>) -> Result<(), JsonRpcError> {
        let params = params.ok_or_else(|| invalid_params("\"textDocument/didOpen\" requires params"))?;
        let uri = string_at(&params, "/textDocument/uri", "textDocument.uri")?;
        let version = number_at(&params, "/textDocument/version", "textDocument.version")?;
        let text = string_at(&params, "/textDocument/text", "textDocument.text")?;

        self.documents.open(&uri, version as i32, &text).map_err(|e| invalid_params(e.to_string()))
    }

    fn handle_did_change(&mut self, params: Option<Value>) -> Result<(), JsonRpcError> {
        let params = params.ok_or_else(|| invalid_params("\"textDocument/didChange\" requires params"))?;
        let uri = string_at(&params, "/textDocument/uri", "textDocument.uri")?;
        let version = number_at(&params, "/textDocument/version", "textDocument.version")?;
        let changes = params
            .get("contentChanges")
            .and_then(Value::as_array)
            .ok_or_else(|| invalid_params("\"textDocument/didChange\" requires a contentChanges array"))?;

        let mut edits = Vec::with_capacity(changes.len());
        for change in changes {
            let text = change
                .get("text")
                .and_then(Value::as_str)
                .ok_or_else(|| invalid_params("each contentChanges entry requires a string \"text\""))?;
            let edit = match change.get("range") {
                None | Some(Value::Null) => Edit::whole_document(text),
                Some(range) => {
                    let start_line = integer_at(range, "/start/line", "range.start.line")?;
                    let start_char = integer_at(range, "/start/character", "range.start.character")?;
                    let end_line = integer_at(range, "/end/line", "range.end.line")?;
                    let end_char = integer_at(range, "/end/character", "range.end.character")?;
                    Edit::range(start_line, start_char, end_line, end_char, text)
                }
            };
            edits.push(edit);
        }

        self.documents.change(&uri, version as i32, &edits).map_err(|e| invalid_params(e.to_string()))
    }

    fn handle_did_close(&mut self, params: Option<Value>) -> Result<(), JsonRpcError> {
        let params = params.ok_or_else(|| invalid_params("\"textDocument/didClose\" requires params"))?;
        let uri = string_at(&params, "/textDocument/uri", "textDocument.uri")?;
        self.documents.close(&uri).map_err(|e| invalid_params(e.to_string()))
    }

    fn handle_did_save(&mut self, params: Option<Value>) -> Result<(), JsonRpcError> {
        let params = params.ok_or_else(|| invalid_params("\"textDocument/didSave\" requires params"))?;
        let uri = string_at(&params, "/textDocument/uri", "textDocument.uri")?;

        if let Some(version) = params.pointer("/textDocument/version").and_then(Value::as_i64) {
            if let Ok(Some(doc)) = self.documents.lookup(&uri) {
                if i64::from(doc.version()) != version {
                    eprintln!(
                        "xatslsp: didSave({uri}): client-reported version {version} disagrees with stored version {}",
                        doc.version()
                    );
                }
            }
        }
        Ok(())
    }
}

fn string_at(value: &Value, pointer: &str, name: &str) -> Result<String, JsonRpcError> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| invalid_params(format!("\"{name}\" is missing or not a string")))
}

fn number_at(value: &Value, pointer: &str, name: &str) -> Result<i64, JsonRpcError> {
    value
        .pointer(pointer)
        .and_then(Value::as_i64)
        .ok_or_else(|| invalid_params(format!("\"{name}\" is missing or not a number")))
}

fn integer_at(value: &Value, pointer: &str, name: &str) -> Result<i64, JsonRpcError> {
    number_at(value, pointer, name)
}

/// POSIX zero-signal probe (`kill(pid, 0)`): checks liveness without
/// sending an actual signal. Mirrors `is_process_running` in the original.
fn is_process_running(pid: i64) -> bool {
    match i32::try_from(pid) {
        Ok(raw) => kill(Pid::from_raw(raw), None).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn initialize_succeeds_once_and_rejects_a_second_call() {
        let mut state = State::new();
        let result = state.route(methods::INITIALIZE, Some(json!({"processId": null, "rootUri": null})), false);
        assert!(result.is_ok());
        assert!(state.initialized);

        let second = state.route(methods::INITIALIZE, Some(json!({})), false);
        assert_eq!(second.unwrap_err().code, -32602);
    }

    #[test]
    fn initialize_rejects_invalid_trace() {
        let mut state = State::new();
        let err = state
            .route(methods::INITIALIZE, Some(json!({"trace": "loud"})), false)
            .unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[test]
    fn initialize_response_matches_fixed_capabilities() {
        let mut state = State::new();
        let result = state.route(methods::INITIALIZE, Some(json!({})), false).unwrap().unwrap();
        assert_eq!(result["capabilities"]["textDocumentSync"]["change"], 2);
        assert_eq!(result["serverInfo"]["name"], "xatslsp");
    }

    #[test]
    fn shutdown_before_initialize_is_invalid_params() {
        let mut state = State::new();
        let err = state.route(methods::SHUTDOWN, None, false).unwrap_err();
        assert_eq!(err.code, -32602);
        assert!(!state.shutdown_requested);
    }

    #[test]
    fn shutdown_after_initialize_frees_documents_and_returns_null() {
        let mut state = State::new();
        state.route(methods::INITIALIZE, Some(json!({})), false).unwrap();
        state
            .route(
                methods::TEXT_DOCUMENT_DID_OPEN,
                Some(json!({"textDocument": {"uri": "file:///a.txt", "version": 1, "text": "x"}})),
                true,
            )
            .unwrap();

        let result = state.route(methods::SHUTDOWN, None, false).unwrap();
        assert_eq!(result, Some(Value::Null));
        assert!(state.shutdown_requested);
        assert!(state.documents.is_empty());
    }

    #[test]
    fn did_open_then_did_change_then_did_close_round_trip() {
        let mut state = State::new();
        state.route(methods::INITIALIZE, Some(json!({})), false).unwrap();

        state
            .route(
                methods::TEXT_DOCUMENT_DID_OPEN,
                Some(json!({"textDocument": {"uri": "file:///a.txt", "version": 1, "text": "hello world"}})),
                true,
            )
            .unwrap();

        state
            .route(
                methods::TEXT_DOCUMENT_DID_CHANGE,
                Some(json!({
                    "textDocument": {"uri": "file:///a.txt", "version": 2},
                    "contentChanges": [
                        {"range": {"start": {"line": 0, "character": 5}, "end": {"line": 0, "character": 11}}, "text": ", rust!"}
                    ]
                })),
                true,
            )
            .unwrap();

        let doc = state.documents.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.text().to_vec(), b"hello, rust!");
        assert_eq!(doc.version(), 2);

        state
            .route(methods::TEXT_DOCUMENT_DID_CLOSE, Some(json!({"textDocument": {"uri": "file:///a.txt"}})), true)
            .unwrap();
        assert!(state.documents.lookup("file:///a.txt").unwrap().is_none());
    }

    #[test]
    fn did_change_whole_document_replace_when_range_absent() {
        let mut state = State::new();
        state.route(methods::INITIALIZE, Some(json!({})), false).unwrap();
        state
            .route(
                methods::TEXT_DOCUMENT_DID_OPEN,
                Some(json!({"textDocument": {"uri": "file:///a.txt", "version": 1, "text": "old"}})),
                true,
            )
            .unwrap();
        state
            .route(
                methods::TEXT_DOCUMENT_DID_CHANGE,
                Some(json!({
                    "textDocument": {"uri": "file:///a.txt", "version": 2},
                    "contentChanges": [{"text": "brand new content"}]
                })),
                true,
            )
            .unwrap();

        let doc = state.documents.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.text().to_vec(), b"brand new content");
    }

    #[test]
    fn unknown_method_request_is_method_not_found() {
        let mut state = State::new();
        state.route(methods::INITIALIZE, Some(json!({})), false).unwrap();
        let err = state.route("workspace/symbol", None, false).unwrap_err();
        assert_eq!(err.code, -32601);
        assert_eq!(err.data, Some(json!("workspace/symbol")));
    }

    #[test]
    fn unknown_method_notification_is_dropped_not_erred() {
        let mut state = State::new();
        state.route(methods::INITIALIZE, Some(json!({})), false).unwrap();
        assert!(state.route("workspace/didChangeConfiguration", None, true).is_ok());
    }

    #[test]
    fn cancel_request_is_a_silent_no_op() {
        let mut state = State::new();
        assert_eq!(state.route(methods::CANCEL_REQUEST, None, true).unwrap(), None);
    }
}
