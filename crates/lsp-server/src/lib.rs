//! JSON-RPC / LSP dispatcher: frame reading, request/notification
//! validation, method routing over [`xatslsp_document_store::DocumentStore`],
//! and response framing.
//!
//! The public surface is [`LspServer`]: construct one around an output
//! sink, then drive it with [`LspServer::serve`] against a [`std::io::BufRead`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod dispatch;
mod message;
mod server;

pub use server::LspServer;
