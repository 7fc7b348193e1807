/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! Reading and writing the brat standoff format (`.txt` + `.ann` pairs).
//!
//! Outbound, a batch's flat stream goes into the `.txt` file verbatim and its
//! tag spans and attributes become entity and attribute lines in the `.ann`
//! file. Inbound, `.ann` lines are parsed back into the data model, including
//! relation lines and the `DCT-Rel` attribute convention, which encodes a
//! self-relation.

use std::io::Write;
use std::str::FromStr;

use crate::error::AnnError;
use crate::registry::TagRegistry;
use crate::types::{AttrId, Attribute, Relation, TagId, TagSpan};

/// Attribute keys that are rendered back into reconstructed inline markup
pub const RENDERABLE_KEYS: &[&str] = &["certainty", "state", "type"];

/// The attribute key encoding a relation between a tag and the document
/// creation time, stored as a self-relation
pub const DCT_REL_KEY: &str = "DCT-Rel";

/// Writes the flat text of a batch to a `.txt` writer
pub fn write_txt<W: Write>(writer: &mut W, text: &str) -> Result<(), AnnError> {
    writer
        .write_all(text.as_bytes())
        .map_err(|e| AnnError::IOError(e, "<txt>".to_string(), "Writing brat text file failed"))
}

/// Writes the entity and attribute lines of a batch to an `.ann` writer.
/// Tag codes resolve to type names through the registry; unknown codes pass
/// through unchanged (an unknown inline tag is still a valid annotation).
pub fn write_ann<W: Write>(
    writer: &mut W,
    spans: &[TagSpan],
    attrs: &[Attribute],
    registry: &TagRegistry,
) -> Result<(), AnnError> {
    let to_io_err =
        |e| AnnError::IOError(e, "<ann>".to_string(), "Writing brat annotation file failed");
    for span in spans {
        writeln!(
            writer,
            "{}\t{} {} {}\t{}",
            span.id,
            registry.name_or_code(&span.tag),
            span.begin,
            span.end,
            span.text
        )
        .map_err(to_io_err)?;
    }
    for attr in attrs {
        writeln!(
            writer,
            "{}\t{} {} {}",
            attr.id, attr.key, attr.tag, attr.value
        )
        .map_err(to_io_err)?;
    }
    Ok(())
}

/// Renders a batch's `.ann` content to a string
pub fn ann_to_string(
    spans: &[TagSpan],
    attrs: &[Attribute],
    registry: &TagRegistry,
) -> Result<String, AnnError> {
    let mut buffer = Vec::new();
    write_ann(&mut buffer, spans, attrs, registry)?;
    String::from_utf8(buffer)
        .map_err(|_| AnnError::OtherError("brat annotation output was not valid utf-8"))
}

/// One parsed `.ann` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnLine {
    /// `T<id>\t<TypeName> <start> <end>\t<surface text>`; the span's `tag`
    /// field holds the type name as written in the file
    Entity(TagSpan),
    /// `A<id>\t<key> T<tag_id> <value>`
    Attribute(Attribute),
    /// `R<id> <label> Arg1:T<tail> Arg2:T<head>`
    Relation { id: String, relation: Relation },
}

/// Parses one `.ann` line. Returns `None` for blank lines and for line kinds
/// this crate does not consume (notes, normalizations, events).
pub fn parse_ann_line(line: &str) -> Result<Option<AnnLine>, AnnError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(None);
    }
    match line.chars().next() {
        Some('T') => parse_entity_line(line).map(Some),
        Some('A') => parse_attribute_line(line).map(Some),
        Some('R') => parse_relation_line(line).map(Some),
        _ => Ok(None),
    }
}

fn parse_entity_line(line: &str) -> Result<AnnLine, AnnError> {
    // five whitespace-separated fields, the surface text keeps its spaces
    let mut parts = line.splitn(5, char::is_whitespace);
    let (id, name, begin, end, text) = match (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) {
        (Some(id), Some(name), Some(begin), Some(end), Some(text)) => (id, name, begin, end, text),
        _ => {
            return Err(AnnError::AnnLine(
                line.to_string(),
                "entity line needs id, type, start, end and surface text",
            ))
        }
    };
    let id = TagId::from_str(id)
        .map_err(|_| AnnError::AnnLine(line.to_string(), "malformed tag id"))?;
    let begin: usize = begin
        .parse()
        .map_err(|_| AnnError::AnnLine(line.to_string(), "start offset is not a number"))?;
    let end: usize = end
        .parse()
        .map_err(|_| AnnError::AnnLine(line.to_string(), "end offset is not a number"))?;
    if end < begin {
        return Err(AnnError::AnnLine(
            line.to_string(),
            "end offset precedes start offset",
        ));
    }
    Ok(AnnLine::Entity(TagSpan {
        id,
        tag: name.to_string(),
        begin,
        end,
        text: text.to_string(),
    }))
}

fn parse_attribute_line(line: &str) -> Result<AnnLine, AnnError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [id, key, tag, value] = fields.as_slice() else {
        return Err(AnnError::AnnLine(
            line.to_string(),
            "attribute line needs id, key, tag reference and value",
        ));
    };
    let id = AttrId::from_str(id)
        .map_err(|_| AnnError::AnnLine(line.to_string(), "malformed attribute id"))?;
    let tag = TagId::from_str(tag)
        .map_err(|_| AnnError::AnnLine(line.to_string(), "malformed tag reference"))?;
    Ok(AnnLine::Attribute(Attribute {
        id,
        key: key.to_string(),
        tag,
        value: value.to_string(),
    }))
}

fn parse_relation_line(line: &str) -> Result<AnnLine, AnnError> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let [id, label, tail, head] = fields.as_slice() else {
        return Err(AnnError::AnnLine(
            line.to_string(),
            "relation line needs id, label and two argument references",
        ));
    };
    let strip_ref = |s: &str| s.rsplit(':').next().unwrap_or(s).to_string();
    Ok(AnnLine::Relation {
        id: id.to_string(),
        relation: Relation {
            tail: strip_ref(tail),
            head: strip_ref(head),
            label: label.to_string(),
        },
    })
}
