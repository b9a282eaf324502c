//! xatslsp: a `file://` language server front-end binary.
//!
//! Speaks JSON-RPC 2.0 framed with `Content-Length` headers over stdin/
//! stdout, per the Language Server Protocol base protocol.
//!
//! Usage:
//!   xatslsp \[options\]
//!
//! Options:
//!   --stdio      Use stdio for communication (default, and the only
//!                transport this server implements)
//!   --version    Show version information
//!   --help       Show this help message

use std::env;
use std::io::{stdin, stdout, BufReader};
use std::process;

use xatslsp_server::LspServer;

fn main() {
    let args: Vec<String> = env::args().collect();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--stdio" => {}
            "--version" => {
                println!("xatslsp {}", env!("CARGO_PKG_VERSION"));
                process::exit(0);
            }
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    let mut reader = BufReader::new(stdin().lock());
    let mut server = LspServer::new(stdout().lock());

    eprintln!("xatslsp: server starting (stdio)");
    if let Err(e) = server.serve(&mut reader) {
        eprintln!("xatslsp: fatal I/O error: {e}");
        process::exit(1);
    }
    eprintln!("xatslsp: input stream closed, shutting down");
}

fn print_help() {
    eprintln!("xatslsp: a file:// language server");
    eprintln!();
    eprintln!("Usage: xatslsp [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --stdio      Use stdio for communication (default)");
    eprintln!("  --version    Show version information");
    eprintln!("  --help       Show this help message");
}
