use std::collections::HashMap;
use std::io::{self, BufRead, Read, Write};

use xatslsp_protocol::{JsonRpcRequest, JsonRpcResponse};

/// Read one framed message: a header block ending in a blank line,
/// followed by `Content-Length` bytes of JSON.
///
/// Returns `Ok(None)` at end of input (the transport's read side has
/// closed) or when the body fails to parse as a `JsonRpcRequest` — a parse
/// failure is logged to stderr and treated the same as EOF by this
/// function; the caller (the dispatcher) is responsible for replying with
/// a JSON-RPC `Parse error` before giving up, which needs the raw bytes,
/// so callers that care about that distinction should prefer
/// [`read_message_bytes`].
pub fn read_message<R: BufRead>(reader: &mut R) -> io::Result<Option<JsonRpcRequest>> {
    let Some(body) = read_message_bytes(reader)? else {
        return Ok(None);
    };
    match serde_json::from_slice(&body) {
        Ok(request) => Ok(Some(request)),
        Err(e) => {
            eprintln!("xatslsp: JSON parse error - {e}");
            Ok(None)
        }
    }
}

/// Read one framed message's raw body bytes, without parsing. Returns
/// `Ok(None)` at end of input.
pub fn read_message_bytes<R: BufRead>(reader: &mut R) -> io::Result<Option<Vec<u8>>> {
    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some((key, value)) = line.split_once(':') {
            headers.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    let Some(content_length) = headers.get("content-length") else {
        return Ok(None);
    };
    let Ok(length) = content_length.parse::<usize>() else {
        return Ok(None);
    };

    let mut body = vec![0u8; length];
    let mut read = 0;
    while read < length {
        match reader.read(&mut body[read..])? {
            0 => return Ok(None),
            n => read += n,
        }
    }
    Ok(Some(body))
}

/// Write a framed response: `Content-Length: <n>\r\n\r\n<body>\r\n`. A
/// `null`/absent body is written as exactly `Content-Length: 0\r\n\r\n\r\n`.
pub fn write_message<W: Write>(writer: &mut W, response: &JsonRpcResponse) -> io::Result<()> {
    let content = serde_json::to_string(response)?;
    write_framed(writer, &content)
}

/// Write a framed server-to-client notification (no `id`, so no response
/// is expected).
pub fn write_notification<W: Write>(
    writer: &mut W,
    method: &str,
    params: serde_json::Value,
) -> io::Result<()> {
    let body = serde_json::json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
    });
    write_framed(writer, &serde_json::to_string(&body)?)
}

fn write_framed<W: Write>(writer: &mut W, content: &str) -> io::Result<()> {
    write!(writer, "Content-Length: {}\r\n\r\n{}\r\n", content.len(), content)?;
    writer.flush()
}

/// Log an outgoing response to stderr for diagnostics.
pub fn log_response(response: &JsonRpcResponse) {
    match serde_json::to_string(response) {
        Ok(s) => eprintln!("xatslsp: sending response: {s}"),
        Err(e) => eprintln!("xatslsp: failed to serialize response for logging: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn framed(body: &str) -> Vec<u8> {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body).into_bytes()
    }

    #[test]
    fn reads_a_well_formed_request() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":null}"#;
        let mut cursor = Cursor::new(framed(body));
        let request = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(request.method, "initialize");
        assert_eq!(request.id, Some(serde_json::json!(1)));
    }

    #[test]
    fn returns_none_at_eof() {
        let mut cursor = Cursor::new(Vec::new());
        assert!(read_message(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn header_matching_is_case_insensitive() {
        let body = r#"{"jsonrpc":"2.0","method":"exit","params":null}"#;
        let raw = format!("content-length: {}\r\n\r\n{}", body.len(), body);
        let mut cursor = Cursor::new(raw.into_bytes());
        let request = read_message(&mut cursor).unwrap().unwrap();
        assert_eq!(request.method, "exit");
    }

    #[test]
    fn write_message_appends_trailing_crlf() {
        let response = JsonRpcResponse::null(Some(serde_json::json!(1)));
        let mut out = Vec::new();
        write_message(&mut out, &response).unwrap();
        let written = String::from_utf8(out).unwrap();
        let body = serde_json::to_string(&response).unwrap();
        assert_eq!(
            written,
            format!("Content-Length: {}\r\n\r\n{}\r\n", body.len(), body)
        );
    }

    #[test]
    fn round_trips_through_read_and_write() {
        let response = JsonRpcResponse::success(Some(serde_json::json!(42)), serde_json::json!("ok"));
        let mut buf = Vec::new();
        write_message(&mut buf, &response).unwrap();
        let mut cursor = Cursor::new(buf);
        let body = read_message_bytes(&mut cursor).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["id"], 42);
        assert_eq!(value["result"], "ok");
    }
}
