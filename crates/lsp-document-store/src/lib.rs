//! Open-document registry keyed by normalised `file://` path.
//!
//! Each entry owns one [`xatslsp_text_buffer::TextBuffer`]. The original
//! keeps a fixed-size hash table with chaining plus a doubly-linked list
//! across all entries — and its lookup loops never advance the chain
//! pointer on a miss, an infinite loop on any hash collision. A
//! `std::collections::HashMap` gives the same O(1) expected lookup and
//! bulk-teardown behaviour the design calls for, with that bug class
//! structurally impossible.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use std::collections::HashMap;

use xatslsp_text_buffer::{TextBuffer, TextPosition};
use xatslsp_uri::{NormalizedPath, UriError};

/// Default chunk size for a newly-opened document's text buffer: 16 KiB,
/// matching the original's `TEXT_BUFFER_CHUNK_SIZE`.
pub const DEFAULT_CHUNK_SIZE: usize = 16 * 1024;

/// Table size passed to [`NormalizedPath::parse`]. The store itself keys
/// documents by `path` in a `HashMap`, so this only sizes the hash carried
/// alongside the path; it has no effect on lookup correctness.
const URI_HASH_TABLE_SIZE: usize = 256;

/// Failure modes surfaced by a [`DocumentStore`] operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DocumentStoreError {
    /// The URI itself failed to parse or validate.
    #[error("invalid document URI: {0}")]
    InvalidUri(#[from] UriError),
    /// `change` or `close` targeted a path with no open document.
    #[error("no open document for this URI")]
    NotOpen,
}

/// A single edit within a `didChange` notification: a range to delete
/// (exclusive end) followed by text to insert at the resulting point.
///
/// All four range coordinates `-1` is the whole-document-replace sentinel
/// (see [`Edit::is_whole_document_replace`]); otherwise they must satisfy
/// `start <= end` in `(line, char)` lexicographic order — the dispatcher is
/// responsible for rejecting anything else before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    /// Start line, or `-1` as part of the whole-document sentinel.
    pub start_line: i64,
    /// Start char, or `-1` as part of the whole-document sentinel.
    pub start_char: i64,
    /// End line, or `-1` as part of the whole-document sentinel.
    pub end_line: i64,
    /// End char, or `-1` as part of the whole-document sentinel.
    pub end_char: i64,
    /// Replacement text, inserted at the point once any deletion is done.
    pub text: String,
}

impl Edit {
    /// Build a ranged edit.
    pub fn range(start_line: i64, start_char: i64, end_line: i64, end_char: i64, text: impl Into<String>) -> Self {
        Edit { start_line, start_char, end_line, end_char, text: text.into() }
    }

    /// Build a whole-document replace edit.
    pub fn whole_document(text: impl Into<String>) -> Self {
        Edit { start_line: -1, start_char: -1, end_line: -1, end_char: -1, text: text.into() }
    }

    /// All four coordinates are `-1`: replace the entire document.
    pub fn is_whole_document_replace(&self) -> bool {
        self.start_line == -1 && self.start_char == -1 && self.end_line == -1 && self.end_char == -1
    }

    /// The range covers at least one codepoint (as opposed to a pure
    /// insertion at a single point). Mirrors `file_edit_range_not_empty`.
    fn range_not_empty(&self) -> bool {
        self.start_line < self.end_line || (self.start_line == self.end_line && self.start_char < self.end_char)
    }
}

/// One open document: its normalised path, the editor-reported version,
/// the open-count protocol-breach tracker, and its text.
#[derive(Debug)]
pub struct Document {
    path: String,
    version: i32,
    open_count: u8,
    text: TextBuffer,
}

impl Document {
    /// The normalised filesystem path this document was opened under.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The editor-reported version as of the last `open` or `change`.
    pub fn version(&self) -> i32 {
        self.version
    }

    /// `0` or `1`; `1` while the editor considers the document open.
    pub fn open_count(&self) -> u8 {
        self.open_count
    }

    /// The document's text buffer.
    pub fn text(&self) -> &TextBuffer {
        &self.text
    }
}

/// A mapping from normalised path to [`Document`].
///
/// Any structure giving O(1) expected lookup by path and allowing bulk
/// teardown satisfies the design; a `HashMap` is the idiomatic choice here
/// in place of the original's hand-rolled hash table plus linked list.
#[derive(Debug)]
pub struct DocumentStore {
    documents: HashMap<String, Document>,
    chunk_size: usize,
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore {
    /// An empty store whose documents use [`DEFAULT_CHUNK_SIZE`] chunks.
    pub fn new() -> Self {
        DocumentStore { documents: HashMap::new(), chunk_size: DEFAULT_CHUNK_SIZE }
    }

    /// An empty store with an explicit chunk size (tests use small sizes
    /// to force chunk-boundary conditions).
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        DocumentStore { documents: HashMap::new(), chunk_size }
    }

    /// Normalise `uri` and resolve the document registered under it, if
    /// any.
    pub fn lookup(&self, uri: &str) -> Result<Option<&Document>, DocumentStoreError> {
        let path = NormalizedPath::parse(uri, URI_HASH_TABLE_SIZE)?;
        Ok(self.documents.get(path.path()))
    }

    /// Open a document at `uri` with initial `contents` and `version`.
    ///
    /// If a document is already registered at this path — a protocol
    /// breach, since the editor should have closed it first — the breach
    /// is logged to stderr and the document is reset anyway: its buffer is
    /// cleared and repopulated with `contents` and `open_count` is forced
    /// back to `1`, matching what the original does modulo its own
    /// increment-without-reset bug.
    pub fn open(&mut self, uri: &str, version: i32, contents: &str) -> Result<(), DocumentStoreError> {
        let path = NormalizedPath::parse(uri, URI_HASH_TABLE_SIZE)?;

        if let Some(doc) = self.documents.get_mut(path.path()) {
            if doc.open_count != 0 {
                eprintln!(
                    "xatslsp-document-store: protocol breach: double open of '{}' (open_count={})",
                    doc.path, doc.open_count
                );
            }
            doc.text.clear();
            doc.text.insert(contents.as_bytes());
            doc.version = version;
            doc.open_count = 1;
            return Ok(());
        }

        let mut text = TextBuffer::new(self.chunk_size);
        text.insert(contents.as_bytes());
        let doc = Document { path: path.path().to_string(), version, open_count: 1, text };
        self.documents.insert(path.path().to_string(), doc);
        Ok(())
    }

    /// Apply `edits` in order to the document at `uri`, then set its
    /// version.
    ///
    /// An unknown path is logged and silently ignored — the dispatcher
    /// only ever calls this from a notification, which cannot be answered
    /// with an error response. Likewise a single edit whose `start`
    /// position cannot be located is logged and skipped; the remaining
    /// edits in the list still apply.
    pub fn change(&mut self, uri: &str, version: i32, edits: &[Edit]) -> Result<(), DocumentStoreError> {
        let path = NormalizedPath::parse(uri, URI_HASH_TABLE_SIZE)?;
        let Some(doc) = self.documents.get_mut(path.path()) else {
            eprintln!("xatslsp-document-store: change to unknown document '{}'", path.path());
            return Err(DocumentStoreError::NotOpen);
        };

        for edit in edits {
            if edit.is_whole_document_replace() {
                doc.text.clear();
            } else {
                let start = TextPosition::new(edit.start_line.max(0) as usize, edit.start_char.max(0) as usize);
                if !doc.text.set_point(start) {
                    eprintln!(
                        "xatslsp-document-store: change({}): unable to locate position ({},{})",
                        path.path(),
                        edit.start_line,
                        edit.start_char
                    );
                    continue;
                }
                if edit.range_not_empty() {
                    let end = TextPosition::new(edit.end_line.max(0) as usize, edit.end_char.max(0) as usize);
                    doc.text.delete_until(end);
                }
            }

            if !edit.text.is_empty() {
                doc.text.insert(edit.text.as_bytes());
            }
        }

        doc.version = version;
        Ok(())
    }

    /// Close the document at `uri`: require `open_count == 1`, decrement,
    /// and remove it from the store.
    ///
    /// An unknown path, or one whose `open_count` isn't `1`, is a protocol
    /// breach: it is logged and the operation is skipped rather than
    /// mutating or removing anything.
    pub fn close(&mut self, uri: &str) -> Result<(), DocumentStoreError> {
        let path = NormalizedPath::parse(uri, URI_HASH_TABLE_SIZE)?;
        let Some(doc) = self.documents.get(path.path()) else {
            eprintln!("xatslsp-document-store: close of unknown document '{}'", path.path());
            return Err(DocumentStoreError::NotOpen);
        };
        if doc.open_count != 1 {
            eprintln!(
                "xatslsp-document-store: protocol breach: close of '{}' with open_count={}",
                path.path(),
                doc.open_count
            );
            return Err(DocumentStoreError::NotOpen);
        }
        self.documents.remove(path.path());
        Ok(())
    }

    /// Remove every document, releasing their text buffers.
    pub fn free(&mut self) {
        self.documents.clear();
    }

    /// The number of currently open documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store currently holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lifecycle_open_lookup_close() {
        // Scenario from spec.md 8.2.2.
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///bin/bash", 1, "hello, world!").unwrap();

        let doc = store.lookup("file:///bin/bash").unwrap().unwrap();
        assert_eq!(doc.version(), 1);
        assert_eq!(doc.open_count(), 1);
        assert_eq!(doc.text().to_vec(), b"hello, world!");

        store.close("file:///bin/bash").unwrap();
        assert!(store.lookup("file:///bin/bash").unwrap().is_none());
    }

    #[test]
    fn close_without_open_is_a_logged_breach() {
        let mut store = DocumentStore::with_chunk_size(64);
        assert_eq!(store.close("file:///nope"), Err(DocumentStoreError::NotOpen));
    }

    #[test]
    fn reopen_without_close_resets_content_and_count() {
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///a.txt", 1, "first").unwrap();
        store.open("file:///a.txt", 2, "second").unwrap();

        let doc = store.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.version(), 2);
        assert_eq!(doc.open_count(), 1);
        assert_eq!(doc.text().to_vec(), b"second");
    }

    #[test]
    fn change_applies_ranged_edit() {
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///a.txt", 1, "hello world").unwrap();
        store
            .change("file:///a.txt", 2, &[Edit::range(0, 5, 0, 11, ", rust!")])
            .unwrap();

        let doc = store.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.text().to_vec(), b"hello, rust!");
        assert_eq!(doc.version(), 2);
    }

    #[test]
    fn change_whole_document_replace() {
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///a.txt", 1, "old content").unwrap();
        store.change("file:///a.txt", 2, &[Edit::whole_document("new content")]).unwrap();

        let doc = store.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.text().to_vec(), b"new content");
    }

    #[test]
    fn change_to_unknown_document_is_reported_not_panicked() {
        let mut store = DocumentStore::with_chunk_size(64);
        assert_eq!(
            store.change("file:///missing.txt", 1, &[Edit::whole_document("x")]),
            Err(DocumentStoreError::NotOpen)
        );
    }

    #[test]
    fn change_skips_edit_with_unreachable_start_but_keeps_going() {
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///a.txt", 1, "short").unwrap();
        // First edit's start is past the end of the document and is
        // skipped; the second edit still applies.
        store
            .change(
                "file:///a.txt",
                2,
                &[Edit::range(5, 0, 5, 0, "unreachable"), Edit::whole_document("replaced")],
            )
            .unwrap();

        let doc = store.lookup("file:///a.txt").unwrap().unwrap();
        assert_eq!(doc.text().to_vec(), b"replaced");
    }

    #[test]
    fn free_clears_every_document() {
        let mut store = DocumentStore::with_chunk_size(64);
        store.open("file:///a.txt", 1, "a").unwrap();
        store.open("file:///b.txt", 1, "b").unwrap();
        assert_eq!(store.len(), 2);
        store.free();
        assert!(store.is_empty());
    }

    #[test]
    fn rejects_invalid_uri() {
        let mut store = DocumentStore::with_chunk_size(64);
        assert!(matches!(
            store.open("https://example.com/a.txt", 1, "x"),
            Err(DocumentStoreError::InvalidUri(_))
        ));
    }
}
