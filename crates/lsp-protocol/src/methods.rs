//! LSP method name constants for the subset of the protocol this server
//! implements: lifecycle (`initialize`/`initialized`/`shutdown`/`exit`) and
//! text document synchronisation.
//!
//! # Examples
//!
//! ```rust
//! use xatslsp_protocol::methods;
//!
//! fn handle_request(method: &str) -> &'static str {
//!     match method {
//!         methods::INITIALIZE => "initialize",
//!         methods::TEXT_DOCUMENT_DID_OPEN => "didOpen",
//!         _ => "unhandled",
//!     }
//! }
//! ```

// ============================================================================
// Lifecycle
// ============================================================================

/// Initialize request - first request from client to server.
pub const INITIALIZE: &str = "initialize";

/// Initialized notification - sent by the client after the `initialize`
/// response is received.
pub const INITIALIZED: &str = "initialized";

/// Shutdown request - graceful server shutdown.
pub const SHUTDOWN: &str = "shutdown";

/// Exit notification - terminate the server process.
pub const EXIT: &str = "exit";

// ============================================================================
// Text Document Synchronization
// ============================================================================

/// Document opened notification.
pub const TEXT_DOCUMENT_DID_OPEN: &str = "textDocument/didOpen";

/// Document changed notification.
pub const TEXT_DOCUMENT_DID_CHANGE: &str = "textDocument/didChange";

/// Document closed notification.
pub const TEXT_DOCUMENT_DID_CLOSE: &str = "textDocument/didClose";

/// Document saved notification.
pub const TEXT_DOCUMENT_DID_SAVE: &str = "textDocument/didSave";

// ============================================================================
// Special Methods
// ============================================================================

/// Cancel request notification. This server has no cancellation support
/// (the dispatch loop is synchronous and single-threaded); it is
/// recognised only so it can be silently ignored rather than logged as an
/// unknown method.
pub const CANCEL_REQUEST: &str = "$/cancelRequest";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_methods() {
        assert_eq!(INITIALIZE, "initialize");
        assert_eq!(INITIALIZED, "initialized");
        assert_eq!(SHUTDOWN, "shutdown");
        assert_eq!(EXIT, "exit");
    }

    #[test]
    fn text_sync_methods() {
        assert_eq!(TEXT_DOCUMENT_DID_OPEN, "textDocument/didOpen");
        assert_eq!(TEXT_DOCUMENT_DID_CHANGE, "textDocument/didChange");
        assert_eq!(TEXT_DOCUMENT_DID_CLOSE, "textDocument/didClose");
        assert_eq!(TEXT_DOCUMENT_DID_SAVE, "textDocument/didSave");
    }

    #[test]
    fn special_methods() {
        assert_eq!(CANCEL_REQUEST, "$/cancelRequest");
    }
}
