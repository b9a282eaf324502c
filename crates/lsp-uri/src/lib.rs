//! `file://` URI validation and normalisation.
//!
//! Only `file://` URIs identifying a document on the local machine are
//! accepted. A valid URI is turned into a [`NormalizedPath`]: a
//! percent-decoded filesystem path string plus a non-cryptographic hash of
//! that path, bounded to a caller-chosen power-of-two table size.
//!
//! # Examples
//!
//! ```
//! use xatslsp_uri::NormalizedPath;
//!
//! let p = NormalizedPath::parse("file://localhost/etc/fstab", 256).unwrap();
//! assert_eq!(p.path(), "/etc/fstab");
//!
//! assert!(NormalizedPath::parse("file://example.com/something.txt", 256).is_err());
//! ```

use url::Url;

/// Why a candidate URI was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UriError {
    /// The string is not a syntactically valid URI.
    #[error("could not parse URI: {0}")]
    Unparsable(String),
    /// The scheme is not `file`.
    #[error("unsupported scheme (expected \"file\")")]
    WrongScheme,
    /// The host is present and is neither empty nor `localhost`.
    #[error("non-local host")]
    NonLocalHost,
    /// The URI has no path component.
    #[error("missing path")]
    MissingPath,
    /// The raw (pre-decode) path contains a literal space character.
    #[error("path contains a literal space")]
    LiteralSpace,
    /// The raw path contains a `./` or `../` segment.
    #[error("path contains a relative segment")]
    RelativeSegment,
    /// The decoded path exceeds the maximum allowed length.
    #[error("decoded path exceeds {max} bytes", max = MAX_PATH_LEN)]
    Oversize,
}

/// Maximum length, in bytes, of a decoded path. Mirrors the original
/// `FILE_URI_MAX` buffer size (1024), minus the implicit C string terminator.
pub const MAX_PATH_LEN: usize = 1023;

/// A validated, percent-decoded local filesystem path derived from a
/// `file://` URI, together with a hash suitable for a power-of-two hash
/// table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedPath {
    path: String,
    hash: u64,
}

impl NormalizedPath {
    /// Parse and validate `uri`, hashing the resulting path modulo
    /// `hash_size_pow2` (which must be a power of two; a non-power-of-two
    /// value simply yields a hash that isn't evenly distributed, it is not
    /// checked here).
    ///
    /// Accepted form: `file://[localhost]/<percent-encoded-path>`. The raw,
    /// still-encoded path must not contain a literal space or a `./`/`../`
    /// segment (editors are expected to percent-encode those); the
    /// percent-decoded path must not exceed [`MAX_PATH_LEN`] bytes.
    pub fn parse(uri: &str, hash_size_pow2: usize) -> Result<Self, UriError> {
        let url = Url::parse(uri).map_err(|e| UriError::Unparsable(e.to_string()))?;

        if url.scheme() != "file" {
            return Err(UriError::WrongScheme);
        }

        match url.host_str() {
            None | Some("") | Some("localhost") => {}
            Some(_) => return Err(UriError::NonLocalHost),
        }

        let raw_path = url.path();
        if raw_path.is_empty() {
            return Err(UriError::MissingPath);
        }

        // These checks run against the still-encoded text of the whole URI,
        // not the decoded path: a percent-encoded space or dot-segment is
        // exactly what percent-encoding exists to let through.
        if uri.contains(' ') {
            return Err(UriError::LiteralSpace);
        }
        if uri.contains("./") || uri.contains("../") {
            return Err(UriError::RelativeSegment);
        }

        let path = percent_decode(raw_path);
        if path.len() > MAX_PATH_LEN {
            return Err(UriError::Oversize);
        }

        let hash = hash_path(&path, hash_size_pow2);
        Ok(NormalizedPath { path, hash })
    }

    /// The percent-decoded local filesystem path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The hash computed at parse time, already reduced modulo the
    /// requested table size.
    pub fn hash(&self) -> u64 {
        self.hash
    }
}

/// Decode `%XX` percent-escapes in `s`. Bytes that fail to decode (a stray
/// `%` not followed by two hex digits) are passed through unchanged.
fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = &s[i + 1..i + 3];
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    // File paths are not guaranteed UTF-8 on every platform, but every
    // document URI this server accepts a text buffer for is; any decoded
    // path that isn't valid UTF-8 is kept lossily rather than rejected.
    String::from_utf8_lossy(&out).into_owned()
}

/// Non-cryptographic DJB2-style hash, masked to a power-of-two table size.
///
/// Mirrors `original_source/src/file_system.c`'s `hash_filename`: an
/// accumulate-and-multiply hash reduced with a bitmask rather than a modulo,
/// which requires `hash_size_pow2` to actually be a power of two.
fn hash_path(path: &str, hash_size_pow2: usize) -> u64 {
    let mut hash: u64 = 5381;
    for b in path.bytes() {
        hash = hash.wrapping_mul(33).wrapping_add(u64::from(b));
    }
    if hash_size_pow2 == 0 {
        return hash;
    }
    hash & (hash_size_pow2 as u64 - 1)
}
