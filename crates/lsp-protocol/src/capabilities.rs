//! The server's `initialize` response body.
//!
//! This server advertises exactly one piece of capability: full-document
//! open/close notifications plus incremental change notifications, no
//! other LSP feature (no completion, hover, diagnostics, etc). The shape
//! mirrors the original implementation's literal capabilities object
//! (`"textDocumentSync": {"openClose": true, "change": 2, "save":
//! {"includeText": false}}`).

use serde_json::{Value, json};

/// `TextDocumentSyncKind.Incremental` per the LSP specification: after the
/// initial full-text open, the client sends only incremental edits.
pub const TEXT_DOCUMENT_SYNC_INCREMENTAL: u8 = 2;

/// Name reported in `InitializeResult.serverInfo.name`.
pub const SERVER_NAME: &str = "xatslsp";

/// Version reported in `InitializeResult.serverInfo.version`.
pub const SERVER_VERSION: &str = "0.1";

/// Build the `InitializeResult` JSON value returned from a successful
/// `initialize` request.
///
/// - `openClose: true` — both `textDocument/didOpen` and
///   `textDocument/didClose` are sent by the client.
/// - `change: 2` (Incremental) — the client sends the full content on open;
///   afterwards, only incremental updates.
/// - `save.includeText: false` — `textDocument/didSave` notifications are
///   not expected to carry document text.
pub fn initialize_result() -> Value {
    json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                "change": TEXT_DOCUMENT_SYNC_INCREMENTAL,
                "save": { "includeText": false }
            }
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": SERVER_VERSION
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_the_fixed_shape() {
        let result = initialize_result();
        assert_eq!(result["capabilities"]["textDocumentSync"]["openClose"], true);
        assert_eq!(result["capabilities"]["textDocumentSync"]["change"], 2);
        assert_eq!(
            result["capabilities"]["textDocumentSync"]["save"]["includeText"],
            false
        );
        assert_eq!(result["serverInfo"]["name"], "xatslsp");
        assert_eq!(result["serverInfo"]["version"], "0.1");
    }
}
