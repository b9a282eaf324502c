//! The top-level message loop: frame reading, JSON parsing, structural
//! validation and response assembly around [`crate::dispatch::State`].

use std::io::{self, BufRead, Write};

use serde_json::Value;

use xatslsp_protocol::{invalid_request, methods, parse_error, server_not_initialized, JsonRpcResponse};
use xatslsp_transport::{log_response, read_message_bytes, write_message};

use crate::dispatch::State;
use crate::message;

/// A running LSP server bound to one output sink. Holds all lifecycle and
/// document state; [`LspServer::serve`] drives it from a byte stream.
pub struct LspServer<W: Write> {
    state: State,
    output: W,
}

impl<W: Write> LspServer<W> {
    /// A fresh, uninitialised server writing framed responses to `output`.
    pub fn new(output: W) -> Self {
        LspServer { state: State::new(), output }
    }

    /// Read and dispatch messages from `reader` until EOF or an `exit`
    /// notification terminates the process.
    pub fn serve<R: BufRead>(&mut self, reader: &mut R) -> io::Result<()> {
        loop {
            let Some(body) = read_message_bytes(reader)? else {
                return Ok(());
            };
            if let Some(response) = self.handle_frame(&body) {
                log_response(&response);
                write_message(&mut self.output, &response)?;
            }
        }
    }

    /// Process one message body. Returns `None` when nothing should be
    /// written back (a notification, or a request somehow producing no
    /// response — the latter never happens in practice but keeps the
    /// return type honest).
    fn handle_frame(&mut self, body: &[u8]) -> Option<JsonRpcResponse> {
        let value: Value = match serde_json::from_slice(body) {
            Ok(v) => v,
            Err(e) => {
                // No id is recoverable from bytes that didn't even parse as JSON.
                eprintln!("xatslsp: parse error: {e}");
                return Some(JsonRpcResponse::error(None, parse_error(e.to_string())));
            }
        };

        let parsed = match message::validate(&value) {
            Ok(m) => m,
            Err(()) => {
                let id = message::extract_id(&value);
                eprintln!("xatslsp: invalid request: {value}");
                return Some(JsonRpcResponse::error(id, invalid_request()));
            }
        };

        // `exit` is processed before anything else, regardless of
        // lifecycle state, and never returns.
        if parsed.method == methods::EXIT {
            self.state.handle_exit();
        }

        let is_notification = parsed.is_notification();

        if !self.state.initialized && parsed.method != methods::INITIALIZE {
            if is_notification {
                eprintln!("xatslsp: dropping '{}' received before initialize", parsed.method);
                return None;
            }
            return Some(JsonRpcResponse::error(parsed.id, server_not_initialized()));
        }

        let result = self.state.route(&parsed.method, parsed.params, is_notification);

        if is_notification {
            if let Err(e) = result {
                eprintln!("xatslsp: notification '{}' failed: {e}", parsed.method);
            }
            return None;
        }

        Some(match result {
            Ok(value) => JsonRpcResponse::success(parsed.id, value.unwrap_or(Value::Null)),
            Err(e) => JsonRpcResponse::error(parsed.id, e),
        })
    }
}
