/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! Core data model: tag spans, attributes, relations and the batch offset state.
//! Everything in here is a plain value type; the algorithms that produce and
//! consume them live in `detag.rs` and `retag.rs`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AnnError;

/// Offsets into a batch's flat character stream. Units are unicode codepoints
/// (not bytes!), 0-indexed, with half-open end offsets.
pub type CharOffset = usize;

/// The reserved attribute key that back-references a tag span from inline
/// markup. It is redundant with the span linkage itself and therefore never
/// materialised as an [`Attribute`].
pub const BACKREF_KEY: &str = "tid";

/// Identifier of a [`TagSpan`], unique within a batch, rendered as `T<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TagId(u32);

impl TagId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

impl FromStr for TagId {
    type Err = AnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix('T')
            .ok_or(AnnError::AnnLine(s.to_string(), "tag id must start with T"))?;
        let value: u32 = digits
            .parse()
            .map_err(|_| AnnError::AnnLine(s.to_string(), "tag id must be T<number>"))?;
        Ok(Self(value))
    }
}

/// Identifier of an [`Attribute`], unique within a batch, rendered as `A<n>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttrId(u32);

impl AttrId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for AttrId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "A{}", self.0)
    }
}

impl FromStr for AttrId {
    type Err = AnnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix('A').ok_or(AnnError::AnnLine(
            s.to_string(),
            "attribute id must start with A",
        ))?;
        let value: u32 = digits
            .parse()
            .map_err(|_| AnnError::AnnLine(s.to_string(), "attribute id must be A<number>"))?;
        Ok(Self(value))
    }
}

/// One inline annotation instance, addressed as a character-offset range into
/// the batch's flat stream. Immutable once created within a batch.
///
/// The `tag` field holds the short tag code (e.g. `d`) when the span was
/// produced by the detagger, and the resolved type name (e.g. `Disease`) when
/// it was parsed from a standoff `.ann` file; the [`crate::TagRegistry`]
/// converts between the two at the serialization boundaries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSpan {
    pub id: TagId,
    pub tag: String,
    pub begin: CharOffset,
    pub end: CharOffset,
    /// Must equal `flat_stream[begin..end]` at all times; checked after every
    /// detag operation.
    pub text: String,
}

impl TagSpan {
    /// The length of the span in unicode codepoints
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.begin
    }
}

/// A key/value pair attached to a [`TagSpan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: AttrId,
    pub key: String,
    /// The tag span this attribute belongs to
    pub tag: TagId,
    pub value: String,
}

/// A link between two tag ids with a relation label, parsed from standoff
/// relation lines or from the `DCT-Rel` self-relation convention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    pub tail: String,
    pub head: String,
    pub label: String,
}

/// The offset counters of a batch, threaded functionally through the detagger:
/// passed in, returned updated. Counters only ever increase within a batch and
/// reset to `(0, 1, 1)` when a batch is flushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchState {
    /// Next character offset in the batch's flat stream
    pub char_offset: CharOffset,
    /// Next tag id to allocate
    pub tag_offset: u32,
    /// Next attribute id to allocate
    pub attr_offset: u32,
}

impl Default for BatchState {
    fn default() -> Self {
        Self {
            char_offset: 0,
            tag_offset: 1,
            attr_offset: 1,
        }
    }
}

impl BatchState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next tag id
    pub(crate) fn next_tag(&mut self) -> TagId {
        let id = TagId::new(self.tag_offset);
        self.tag_offset += 1;
        id
    }

    /// Allocates the next attribute id
    pub(crate) fn next_attr(&mut self) -> AttrId {
        let id = AttrId::new(self.attr_offset);
        self.attr_offset += 1;
        id
    }
}

/// Prints debug messages to standard error output, only when debug mode is
/// enabled in the configuration. The message is produced lazily.
pub(crate) fn debug<F>(config: &Config, message: F)
where
    F: FnOnce() -> String,
{
    if config.debug() {
        eprintln!("[reportann debug] {}", message());
    }
}
