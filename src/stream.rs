/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The cross-document stream multiplexer's boundary convention.
//!
//! Many per-record documents are concatenated into one flat offset space for
//! brat's file-per-batch layout. Record boundaries within that stream are
//! marked by synthetic comment lines of the form
//!
//! ```text
//! ## line id: 3 ||| seq: 2 ||| patient: P0017 ||| title: S ||| date: 2014-03-20
//! ```
//!
//! Outbound, [`CommentLine`] renders such a line from record metadata and the
//! detagger treats it as an ordinary (untagged) line of text. Inbound,
//! [`StreamSplitter`] recognises comment lines by a fixed prefix pattern and
//! uses each one as the boundary where the previous record's content ends.

use regex::Regex;

/// The field separator within a comment line
pub const FIELD_SEPARATOR: &str = " ||| ";

/// The fixed pattern recognising a comment line and capturing the record id
const COMMENT_PATTERN: &str = r"^## line id: (\w+)";

/// A record-boundary comment line: the record identifier plus enough metadata
/// key/value pairs to reverse the record mapping later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentLine {
    record_id: String,
    fields: Vec<(String, String)>,
}

impl CommentLine {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            fields: Vec::new(),
        }
    }

    /// Builder pattern to append a metadata field. Fields render in insertion
    /// order.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    /// Renders the comment line (without trailing newline)
    pub fn render(&self) -> String {
        let mut out = format!("## line id: {}", self.record_id);
        for (key, value) in &self.fields {
            out.push_str(FIELD_SEPARATOR);
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
        }
        out
    }
}

/// The per-record line cache produced by splitting a flat batch stream on its
/// comment lines. `record_id` is `None` only for content preceding the first
/// comment line (which no record can claim).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLines {
    pub record_id: Option<String>,
    pub lines: Vec<String>,
}

/// Splits a concatenated flat stream back into per-record line caches.
#[derive(Debug, Clone)]
pub struct StreamSplitter {
    pattern: Regex,
}

impl Default for StreamSplitter {
    fn default() -> Self {
        Self {
            pattern: Regex::new(COMMENT_PATTERN).expect("comment pattern must compile"),
        }
    }
}

impl StreamSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record id if `line` is a comment line
    pub fn record_id<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.pattern
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
    }

    /// Splits the stream on newlines and groups the lines between consecutive
    /// comment lines into per-record caches. The final record's cache is
    /// flushed at end of stream. Comment lines themselves are never part of
    /// any cache.
    pub fn split(&self, stream: &str) -> Vec<RecordLines> {
        let mut records = Vec::new();
        let mut current = RecordLines {
            record_id: None,
            lines: Vec::new(),
        };
        for line in stream.split('\n') {
            if let Some(id) = self.record_id(line) {
                if current.record_id.is_some() || !current.lines.is_empty() {
                    records.push(current);
                }
                current = RecordLines {
                    record_id: Some(id.to_string()),
                    lines: Vec::new(),
                };
            } else {
                current.lines.push(line.to_string());
            }
        }
        if current.record_id.is_some() || !current.lines.is_empty() {
            records.push(current);
        }
        records
    }
}
