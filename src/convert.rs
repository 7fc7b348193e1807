/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! High-level conversion drivers: accumulating documents into batches for
//! standoff output, and merging standoff content back into the document
//! store.
//!
//! Per-record failures (malformed markup, offset-integrity violations) are
//! isolated: the record is excluded from the batch, the failure is recorded
//! as a typed [`RecordOutcome`], and the run continues. Nothing requires
//! reading logs to know how many records failed and why.

use std::collections::BTreeSet;
use std::io::Write;

use crate::brat::{self, parse_ann_line, AnnLine, DCT_REL_KEY, RENDERABLE_KEYS};
use crate::chunker::FlushPolicy;
use crate::config::{Config, Configurable};
use crate::detag::{flatten, wrap_lines};
use crate::error::AnnError;
use crate::file::{get_filepath, open_file_writer};
use crate::registry::TagRegistry;
use crate::retag::reinsert;
use crate::sanitize::Sanitizer;
use crate::segment::Segmenter;
use crate::store::{date_part, DocumentStore, Record};
use crate::stream::{CommentLine, StreamSplitter};
use crate::types::{debug, Attribute, BatchState, Relation, TagSpan};

/// One flushed batch: a flat character stream plus the tag spans and
/// attributes sharing its offset space, ready for standoff serialization.
#[derive(Debug, Clone)]
pub struct Batch {
    pub label: String,
    pub text: String,
    pub spans: Vec<TagSpan>,
    pub attrs: Vec<Attribute>,
}

/// The per-record result of an outbound conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Converted { record_id: String },
    Skipped { record_id: String, reason: String },
}

/// Aggregated outcome of one outbound conversion run
#[derive(Debug, Clone, Default)]
pub struct ConversionReport {
    pub outcomes: Vec<RecordOutcome>,
    pub batch_labels: Vec<String>,
}

impl ConversionReport {
    /// Number of records that made it into a batch
    pub fn converted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, RecordOutcome::Converted { .. }))
            .count()
    }

    /// Number of records that were skipped, with their reasons available in
    /// [`Self::outcomes`]
    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.converted()
    }
}

/// Accumulates documents into one batch-global offset space and flushes
/// complete [`Batch`]es according to the configured policy.
pub struct BatchAccumulator {
    config: Config,
    policy: FlushPolicy,
    finding_rules: Sanitizer,
    markup_rules: Sanitizer,
    chars: Vec<char>,
    spans: Vec<TagSpan>,
    attrs: Vec<Attribute>,
    state: BatchState,
    /// Group id of the batch currently being accumulated
    group: Option<String>,
    /// 1-based index of the first record in the current batch
    first_index: usize,
    /// Count of records accepted across all batches so far
    accepted: usize,
    report: ConversionReport,
}

impl Configurable for BatchAccumulator {
    fn config(&self) -> &Config {
        &self.config
    }

    fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    fn set_config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }
}

impl BatchAccumulator {
    pub fn new(config: &Config, policy: FlushPolicy) -> Self {
        Self {
            config: config.clone(),
            policy,
            finding_rules: Sanitizer::finding_defaults(),
            markup_rules: Sanitizer::markup_defaults(),
            chars: Vec::new(),
            spans: Vec::new(),
            attrs: Vec::new(),
            state: BatchState::new(),
            group: None,
            first_index: 1,
            accepted: 0,
            report: ConversionReport::default(),
        }
    }

    /// Builder pattern to override the finding-text sanitizer
    pub fn with_finding_rules(mut self, rules: Sanitizer) -> Self {
        self.finding_rules = rules;
        self
    }

    /// Builder pattern to override the markup sanitizer
    pub fn with_markup_rules(mut self, rules: Sanitizer) -> Self {
        self.markup_rules = rules;
        self
    }

    fn buffered(&self) -> bool {
        !self.chars.is_empty()
    }

    fn skip(&mut self, record_id: u32, reason: impl Into<String>) {
        self.report.outcomes.push(RecordOutcome::Skipped {
            record_id: record_id.to_string(),
            reason: reason.into(),
        });
    }

    /// Pushes one record. Returns a flushed batch when the policy triggered a
    /// flush before this record was accepted.
    pub fn push(
        &mut self,
        record_id: u32,
        record: &Record,
        segmenter: &dyn Segmenter,
    ) -> Option<Batch> {
        let columns = self.config.columns().clone();

        let Some(finding) = record.get_str(&columns.annotated) else {
            self.skip(record_id, "record has no annotated text column");
            return None;
        };
        if let Some(title) = record.get_str(&columns.title) {
            // illegible reports are marked with a bare "I" in the title column
            if title.trim() == "I" {
                self.skip(record_id, "record is marked illegible");
                return None;
            }
        }
        let group = record
            .get_str(&columns.record_group)
            .unwrap_or_default()
            .trim()
            .to_string();

        let mut flushed = None;
        if self.buffered()
            && self
                .policy
                .should_flush(&group, self.group.as_deref(), self.accepted + 1)
        {
            flushed = Some(self.flush());
        }

        let mut comment = CommentLine::new(record_id.to_string())
            .with_field(columns.record_group.as_str(), group.as_str());
        if let Some(patient) = record.get_str(&columns.patient) {
            comment = comment.with_field(columns.patient.as_str(), patient.trim());
        }
        if let Some(title) = record.get_str(&columns.title) {
            comment = comment.with_field(columns.title.as_str(), title.trim());
        }
        if let Some(date) = record.get_str(&columns.date) {
            comment = comment.with_field(columns.date.as_str(), date_part(&date));
        }

        let finding = self.finding_rules.sanitize(&finding);
        let body = match segmenter.segment(&finding) {
            Ok(lines) => lines.join("\n"),
            Err(e) => {
                debug(&self.config, || {
                    format!("segmentation failed for record {}: {}", record_id, e)
                });
                self.skip(record_id, String::from(&e));
                return flushed;
            }
        };
        let markup = self
            .markup_rules
            .sanitize(&wrap_lines(Some(&comment.render()), &body));

        match flatten(&record_id.to_string(), &markup, self.state) {
            Ok(flat) => {
                self.chars.extend(flat.chars);
                self.spans.extend(flat.spans);
                self.attrs.extend(flat.attrs);
                self.state = flat.state;
                self.group = Some(group);
                self.accepted += 1;
                self.report.outcomes.push(RecordOutcome::Converted {
                    record_id: record_id.to_string(),
                });
            }
            Err(e) => {
                // failure isolation: drop the one record, keep the batch state
                debug(&self.config, || format!("record {} skipped: {}", record_id, e));
                self.skip(record_id, String::from(&e));
            }
        }
        flushed
    }

    fn flush(&mut self) -> Batch {
        let label = self.policy.batch_label(
            self.group.as_deref().unwrap_or(""),
            self.first_index,
            self.accepted,
        );
        self.report.batch_labels.push(label.clone());
        let batch = Batch {
            label,
            text: self.chars.drain(..).collect(),
            spans: std::mem::take(&mut self.spans),
            attrs: std::mem::take(&mut self.attrs),
        };
        self.state = BatchState::new();
        self.group = None;
        self.first_index = self.accepted + 1;
        batch
    }

    /// Flushes whatever remains buffered and returns the final report.
    pub fn finish(mut self) -> (Option<Batch>, ConversionReport) {
        let last = if self.buffered() {
            Some(self.flush())
        } else {
            None
        };
        (last, self.report)
    }
}

/// Runs the outbound pipeline in memory: every record of the store becomes
/// part of a batch (or a skipped outcome).
pub fn collect_batches(
    store: &DocumentStore,
    config: &Config,
    policy: FlushPolicy,
    segmenter: &dyn Segmenter,
) -> (Vec<Batch>, ConversionReport) {
    let mut accumulator = BatchAccumulator::new(config, policy);
    let mut batches = Vec::new();
    for (record_id, record) in store.records() {
        if let Some(batch) = accumulator.push(record_id, record, segmenter) {
            batches.push(batch);
        }
    }
    let (last, report) = accumulator.finish();
    batches.extend(last);
    (batches, report)
}

/// Converts the store to brat standoff file pairs `<base>.<label>.txt` /
/// `<base>.<label>.ann`.
pub fn store_to_standoff(
    store: &DocumentStore,
    registry: &TagRegistry,
    config: &Config,
    policy: FlushPolicy,
    segmenter: &dyn Segmenter,
    base: &str,
) -> Result<ConversionReport, AnnError> {
    let (batches, report) = collect_batches(store, config, policy, segmenter);
    for batch in &batches {
        let txt_name = format!("{}.{}.txt", base, batch.label);
        let ann_name = format!("{}.{}.ann", base, batch.label);
        let mut txt_writer = open_file_writer(&txt_name, config)?;
        brat::write_txt(&mut txt_writer, &batch.text)?;
        txt_writer
            .flush()
            .map_err(|e| AnnError::IOError(e, txt_name, "Flushing brat text file failed"))?;
        let mut ann_writer = open_file_writer(&ann_name, config)?;
        brat::write_ann(&mut ann_writer, &batch.spans, &batch.attrs, registry)?;
        ann_writer
            .flush()
            .map_err(|e| AnnError::IOError(e, ann_name, "Flushing brat annotation file failed"))?;
        debug(config, || {
            format!(
                "flushed batch {}: {} spans, {} attributes",
                batch.label,
                batch.spans.len(),
                batch.attrs.len()
            )
        });
    }
    Ok(report)
}

/// Aggregated outcome of merging one standoff pair back into the store
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    /// Record ids that received content
    pub merged: Vec<String>,
    /// Comment-line record ids with no matching record in the store. These
    /// are ignored by design, not errors; they are reported here so callers
    /// can still notice them.
    pub ignored: Vec<String>,
    /// `.ann` lines that could not be parsed (skipped)
    pub skipped_lines: Vec<String>,
    /// Attribute lines whose key is neither renderable nor a relation
    pub unhandled_attributes: Vec<String>,
    /// Set when inline markup could not be reconstructed (e.g. an unknown tag
    /// type); raw text is still merged, annotated text and relations are not
    pub retag_error: Option<String>,
}

/// Merges one standoff pair back into the document store: a raw-text pass
/// over the `.txt` stream, then a re-tagging pass inserting the `.ann`
/// entities and renderable attributes as inline markup, split per record on
/// the comment-line boundaries.
pub fn merge_standoff(
    store: &mut DocumentStore,
    txt: &str,
    ann: &str,
    registry: &TagRegistry,
    config: &Config,
) -> MergeReport {
    let splitter = StreamSplitter::new();
    let mut report = MergeReport::default();

    let mut spans: Vec<TagSpan> = Vec::new();
    let mut render_attrs: Vec<Attribute> = Vec::new();
    let mut relations: Vec<Relation> = Vec::new();

    for line in ann.lines() {
        match parse_ann_line(line) {
            Ok(Some(AnnLine::Entity(span))) => spans.push(span),
            Ok(Some(AnnLine::Attribute(attr))) => {
                if RENDERABLE_KEYS.contains(&attr.key.as_str()) {
                    render_attrs.push(attr);
                } else if attr.key == DCT_REL_KEY {
                    // document-creation-time relation: a self-relation
                    relations.push(Relation {
                        tail: attr.tag.to_string(),
                        head: attr.tag.to_string(),
                        label: attr.value,
                    });
                } else {
                    debug(config, || format!("unhandled attribute key: {}", line));
                    report.unhandled_attributes.push(line.to_string());
                }
            }
            Ok(Some(AnnLine::Relation { relation, .. })) => relations.push(relation),
            Ok(None) => {}
            Err(e) => {
                debug(config, || format!("skipping ann line: {}", e));
                report.skipped_lines.push(line.to_string());
            }
        }
    }

    // first pass: markup-stripped text, straight from the .txt stream
    let raw_text_key = config.raw_text_key().to_string();
    for record_lines in splitter.split(txt) {
        let Some(id) = record_lines.record_id else {
            continue;
        };
        match store.get_mut_by_str(&id) {
            Some(record) => {
                record.set_str(&raw_text_key, record_lines.lines.join("\n"));
                report.merged.push(id);
            }
            None => report.ignored.push(id),
        }
    }

    // second pass: reconstructed inline markup plus relations
    let annotated_key = config.columns().annotated.clone();
    let relations_key = config.relations_key().to_string();
    match reinsert(txt, &spans, &render_attrs, registry) {
        Ok(markup) => {
            for record_lines in splitter.split(&markup) {
                let Some(id) = record_lines.record_id else {
                    continue;
                };
                if let Some(record) = store.get_mut_by_str(&id) {
                    record.set_str(&annotated_key, record_lines.lines.join("\n"));
                    record.set_relations(&relations_key, &relations);
                }
            }
        }
        Err(e) => {
            debug(config, || format!("re-tagging failed: {}", e));
            report.retag_error = Some(String::from(&e));
        }
    }
    report
}

/// Merges every standoff pair under `dir` whose file name starts with `base`
/// back into the store. Returns one report per pair, keyed by the pair's
/// stem. Stems without a `.txt` file are skipped; a missing `.ann` file
/// means a pair without annotations.
pub fn merge_standoff_dir(
    store: &mut DocumentStore,
    dir: &str,
    base: &str,
    registry: &TagRegistry,
    config: &Config,
) -> Result<Vec<(String, MergeReport)>, AnnError> {
    let dirpath = get_filepath(dir, config.workdir())?;
    let entries = std::fs::read_dir(&dirpath).map_err(|e| {
        AnnError::IOError(
            e,
            dirpath.to_string_lossy().into_owned(),
            "Reading standoff directory failed",
        )
    })?;

    let mut stems = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| {
            AnnError::IOError(
                e,
                dirpath.to_string_lossy().into_owned(),
                "Reading standoff directory entry failed",
            )
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(base) {
            if let Some(stem) = name
                .strip_suffix(".txt")
                .or_else(|| name.strip_suffix(".ann"))
            {
                stems.insert(stem.to_string());
            }
        }
    }

    let mut reports = Vec::new();
    for stem in stems {
        let txt_path = dirpath.join(format!("{}.txt", stem));
        let Ok(txt) = std::fs::read_to_string(&txt_path) else {
            debug(config, || format!("no text file for stem {}, skipping", stem));
            continue;
        };
        let ann = std::fs::read_to_string(dirpath.join(format!("{}.ann", stem))).unwrap_or_default();
        let report = merge_standoff(store, &txt, &ann, registry, config);
        reports.push((stem, report));
    }
    Ok(reports)
}
