/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The standoff re-tagger: reconstructs inline markup from a flat character
//! stream plus offset-addressed tag spans and their attributes.
//!
//! The algorithm is two-phase. Phase one computes an immutable, fully sorted
//! boundary-insertion plan; phase two walks the character stream once and
//! emits markers and characters into a fresh output buffer. No buffer is ever
//! mutated while also being indexed, so an insertion can never shift an
//! offset that still has to be processed.
//!
//! Tie-break rules at equal offsets, applied consistently:
//! - close markers are emitted before open markers (so two adjacent spans
//!   sharing a boundary render as `...</x><y>...`, not inverted nesting);
//! - among close markers, the later-starting (inner) span closes first;
//! - among open markers, the later-ending (outer) span opens first.

use smallvec::SmallVec;

use crate::error::AnnError;
use crate::registry::TagRegistry;
use crate::types::{Attribute, CharOffset, TagSpan, BACKREF_KEY};

/// Close markers rank before open markers at the same offset
const RANK_CLOSE: u8 = 0;
const RANK_OPEN: u8 = 1;

/// One planned marker insertion. Plans are built in full, sorted once, and
/// then only read.
#[derive(Debug, Clone)]
struct PlannedMarker {
    offset: CharOffset,
    rank: u8,
    /// Secondary ordering among markers of the same rank at the same offset
    depth_key: usize,
    markup: String,
}

/// Reconstructs inline markup by inserting open/close markers for every span
/// into `flat`. The spans' `tag` field must hold type names resolvable by the
/// registry; an unresolvable name is fatal for the whole reconstruction since
/// the output markup would be meaningless.
///
/// Offsets are in unicode codepoints, consistent with what the detagger
/// produced.
pub fn reinsert(
    flat: &str,
    spans: &[TagSpan],
    attrs: &[Attribute],
    registry: &TagRegistry,
) -> Result<String, AnnError> {
    let chars: Vec<char> = flat.chars().collect();
    let plan = build_plan(&chars, spans, attrs, registry)?;

    let mut out = String::with_capacity(flat.len() + plan.len() * 8);
    let mut next = 0;
    for (offset, c) in chars.iter().enumerate() {
        while next < plan.len() && plan[next].offset == offset {
            out.push_str(&plan[next].markup);
            next += 1;
        }
        out.push(*c);
    }
    // markers at the very end of the stream
    for marker in &plan[next..] {
        out.push_str(&marker.markup);
    }
    Ok(out)
}

fn build_plan(
    chars: &[char],
    spans: &[TagSpan],
    attrs: &[Attribute],
    registry: &TagRegistry,
) -> Result<Vec<PlannedMarker>, AnnError> {
    let mut plan = Vec::with_capacity(spans.len() * 2);
    for span in spans {
        if span.end > chars.len() || span.begin > span.end {
            return Err(AnnError::SerializationError(format!(
                "tag {} spans {}..{} which exceeds the text length of {}",
                span.id,
                span.begin,
                span.end,
                chars.len()
            )));
        }
        let code = registry.code_for(&span.tag)?;

        let own_attrs: SmallVec<[&Attribute; 4]> = attrs
            .iter()
            .filter(|a| a.tag == span.id && a.key != BACKREF_KEY)
            .collect();
        let mut open = format!("<{} tid=\"{}\"", code, span.id);
        for attr in own_attrs {
            open.push_str(&format!(" {}=\"{}\"", attr.key, attr.value));
        }
        open.push('>');

        plan.push(PlannedMarker {
            offset: span.begin,
            rank: RANK_OPEN,
            // outer spans (larger end) open first
            depth_key: usize::MAX - span.end,
            markup: open,
        });
        plan.push(PlannedMarker {
            offset: span.end,
            rank: RANK_CLOSE,
            // inner spans (larger begin) close first
            depth_key: usize::MAX - span.begin,
            markup: format!("</{}>", code),
        });
    }
    // stable sort: ties beyond the explicit keys keep span (= assignment) order
    plan.sort_by_key(|m| (m.offset, m.rank, m.depth_key));
    Ok(plan)
}
