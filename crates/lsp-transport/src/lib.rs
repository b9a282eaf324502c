//! Content-Length message framing for xatslsp.
//!
//! The LSP base protocol frames every message with an HTTP-style header
//! block terminated by a blank line, followed by exactly `Content-Length`
//! bytes of JSON body:
//!
//! ```text
//! Content-Length: 38\r\n
//! \r\n
//! {"jsonrpc":"2.0","id":1,"result":null}\r\n
//! ```
//!
//! This crate provides:
//!
//! - [`read_message`] - read and parse one framed request/notification
//! - [`write_message`] - write a framed response
//! - [`write_notification`] - write a framed server-to-client notification
//! - [`log_response`] - stderr diagnostic logging for outgoing responses
//!
//! # Example
//!
//! ```no_run
//! use std::io::{BufReader, stdin, stdout};
//! use xatslsp_transport::{read_message, write_message};
//! use xatslsp_protocol::JsonRpcResponse;
//!
//! let mut reader = BufReader::new(stdin());
//! let mut writer = stdout();
//!
//! if let Ok(Some(request)) = read_message(&mut reader) {
//!     let response = JsonRpcResponse::null(request.id);
//!     write_message(&mut writer, &response).ok();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod framing;

pub use framing::{log_response, read_message, write_message, write_notification};
