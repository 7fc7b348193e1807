/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! ## Introduction
//!
//! Reportann converts clinical-report annotations between several textual
//! representations: spreadsheet rows, a JSON document store, inline-tagged
//! markup, the brat standoff format (`.txt` + `.ann` pairs) and a BIO-tagged
//! token format.
//!
//! The heart of the library is the offset-tracking tag/detag engine:
//!
//! * [`flatten`] parses inline markup into a tree and flattens it into a flat
//!   character stream plus offset-addressed [`TagSpan`]s and [`Attribute`]s,
//!   with batch-global offsets carried across documents by an explicit
//!   [`BatchState`].
//! * [`reinsert`] reverses the process: given a flat stream and a set of tag
//!   spans with attributes it reconstructs the inline markup, inserting
//!   open/close markers from an immutable, fully sorted insertion plan.
//!
//! Around that engine sit the supporting pieces:
//!
//! * [`TagRegistry`] - the closed bidirectional mapping between short tag
//!   codes and standoff type names
//! * [`Sanitizer`] - ordered string-level corrections for malformed source
//!   markup
//! * [`CommentLine`] / [`StreamSplitter`] - the record-boundary convention
//!   used to multiplex many documents into one offset space and back
//! * [`FlushPolicy`] - group-change or fixed-count batch chunking
//! * [`DocumentStore`] - the JSON document store the annotations are merged
//!   back into
//! * [`BatchAccumulator`] and the `store_to_standoff` / `merge_standoff`
//!   drivers in [`convert`]
//!
//! The engine maintains three invariants, checked eagerly: every span's
//! surface text equals the flat-stream substring at its offsets; offsets and
//! ids only ever increase within a batch; and per-record failures are
//! isolated, never silently corrupting a batch.

mod bio;
mod brat;
mod chunker;
mod config;
pub mod convert;
mod detag;
mod error;
mod file;
mod registry;
mod retag;
mod sanitize;
mod segment;
mod store;
mod stream;
mod types;

#[cfg(feature = "csv")]
mod csv;

// Our internal crate structure is not very relevant to the outside world,
// expose all structs and traits in the root namespace, and be explicit about it:

pub use bio::{bio_to_markup, EOR};
pub use brat::{
    ann_to_string, parse_ann_line, write_ann, write_txt, AnnLine, DCT_REL_KEY, RENDERABLE_KEYS,
};
pub use chunker::FlushPolicy;
pub use config::{ColumnMap, Config, Configurable};
pub use convert::{
    collect_batches, merge_standoff, merge_standoff_dir, store_to_standoff, Batch,
    BatchAccumulator, ConversionReport, MergeReport, RecordOutcome,
};
#[cfg(feature = "csv")]
pub use crate::csv::{read_csv, read_csv_file};
pub use detag::{flatten, wrap_lines, Flattened, DOC_TAG, LINE_TAG};
pub use error::AnnError;
pub use registry::TagRegistry;
pub use retag::reinsert;
pub use sanitize::{Rule, Sanitizer};
pub use segment::{CommandSegmenter, NewlineSegmenter, Segmenter};
pub use store::{date_part, DocumentStore, Record};
pub use stream::{CommentLine, RecordLines, StreamSplitter, FIELD_SEPARATOR};
pub use types::{
    AttrId, Attribute, BatchState, CharOffset, Relation, TagId, TagSpan, BACKREF_KEY,
};
