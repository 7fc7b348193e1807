/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The flattening detagger: parses sanitized inline-tagged markup into a tree
//! and walks it in document order, producing a flat character stream with all
//! markup stripped plus an ordered list of [`TagSpan`]s and [`Attribute`]s
//! whose offsets point into that stream.
//!
//! Offsets are batch-global: the [`BatchState`] carries the running counters
//! across documents and is threaded in and out functionally, so that many
//! documents concatenate into a single offset space.

use roxmltree::{Document, Node};

use crate::error::AnnError;
use crate::types::{Attribute, BatchState, TagSpan, BACKREF_KEY};

/// The synthetic root element wrapping a whole document
pub const DOC_TAG: &str = "doc";
/// The synthetic wrapper element for one logical line/unit
pub const LINE_TAG: &str = "line";

/// The output of one [`flatten`] call: the markup-stripped character stream of
/// one document, the spans and attributes extracted from it, and the updated
/// batch state to thread into the next document.
#[derive(Debug, Clone)]
pub struct Flattened {
    pub chars: Vec<char>,
    pub spans: Vec<TagSpan>,
    pub attrs: Vec<Attribute>,
    pub state: BatchState,
}

impl Flattened {
    fn new(state: BatchState) -> Self {
        Self {
            chars: Vec::new(),
            spans: Vec::new(),
            attrs: Vec::new(),
            state,
        }
    }

    /// The flat text as a string
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }
}

/// Wraps finding text in the line-delimited pseudo-XML envelope: one `<line>`
/// element per input line (trimmed), optionally preceded by a head line,
/// all under a single `<doc>` root.
pub fn wrap_lines(head_line: Option<&str>, body: &str) -> String {
    let mut out = String::with_capacity(body.len() + 64);
    out.push_str("<doc>\n");
    if let Some(head) = head_line {
        out.push_str("<line>");
        out.push_str(head);
        out.push_str("</line>\n");
    }
    for line in body.split('\n') {
        out.push_str("<line>");
        out.push_str(line.trim());
        out.push_str("</line>\n");
    }
    out.push_str("</doc>\n");
    out
}

/// Flattens one document's inline markup. `record_id` is only used to
/// attribute errors to the offending record.
///
/// Returns the flat character stream (markup stripped), the tag spans covering
/// each element's direct text, one attribute per XML attribute (excluding the
/// reserved back-reference key), and the updated batch state.
///
/// Immediately verifies the standing invariant that every span's recorded
/// surface text equals the flat-stream substring at its offsets, so an
/// offset-accounting bug can never silently corrupt standoff output.
pub fn flatten(record_id: &str, markup: &str, state: BatchState) -> Result<Flattened, AnnError> {
    let doc = Document::parse(markup).map_err(|e| AnnError::MalformedMarkup {
        record_id: record_id.to_string(),
        message: e.to_string(),
        markup: markup.to_string(),
    })?;

    let base = state.char_offset;
    let mut flat = Flattened::new(state);

    for line in doc.root_element().children().filter(|n| n.is_element()) {
        let unit_start = flat.chars.len();
        collect(line, true, &mut flat);
        // every non-empty unit must end in exactly one newline, so that
        // line-based record splitting stays possible downstream
        if flat.chars.len() > unit_start && flat.chars.last() != Some(&'\n') {
            flat.chars.push('\n');
            flat.state.char_offset += 1;
        }
    }

    for span in &flat.spans {
        let found: String = flat.chars[span.begin - base..span.end - base].iter().collect();
        if found != span.text {
            return Err(AnnError::OffsetIntegrity {
                record_id: record_id.to_string(),
                tag_id: span.id.to_string(),
                expected: span.text.clone(),
                found,
            });
        }
    }

    Ok(flat)
}

/// Depth-first document-order walk of one element: direct leading text first
/// (tagged, unless this is a synthetic wrapper), then each child subtree,
/// then that child's tail text (always untagged).
fn collect(node: Node, is_wrapper: bool, flat: &mut Flattened) {
    let mut leading = true;
    for child in node.children() {
        if child.is_text() {
            let text = child.text().unwrap_or("");
            if leading && !is_wrapper && !text.is_empty() {
                let begin = flat.state.char_offset;
                flat.chars.extend(text.chars());
                flat.state.char_offset += text.chars().count();
                let id = flat.state.next_tag();
                for attr in node.attributes() {
                    if attr.name() == BACKREF_KEY {
                        continue;
                    }
                    let attr_id = flat.state.next_attr();
                    flat.attrs.push(Attribute {
                        id: attr_id,
                        key: attr.name().to_string(),
                        tag: id,
                        value: attr.value().to_string(),
                    });
                }
                flat.spans.push(TagSpan {
                    id,
                    tag: node.tag_name().name().to_string(),
                    begin,
                    end: flat.state.char_offset,
                    text: text.to_string(),
                });
            } else {
                flat.chars.extend(text.chars());
                flat.state.char_offset += text.chars().count();
            }
            leading = false;
        } else if child.is_element() {
            leading = false;
            collect(child, false, flat);
        } else {
            // comments and processing instructions end the leading text
            leading = false;
        }
    }
}
