//! JSON-RPC wire types, error codes, method name constants and the fixed
//! `initialize` capabilities payload, shared between the transport and
//! server crates.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod capabilities;
mod errors;
mod jsonrpc;
pub mod methods;

pub use errors::*;
pub use jsonrpc::*;
