use std::fs;

use reportann::*;

mod common;
use common::*;

#[test]
fn outbound_batches_per_group() {
    let config = Config::default();
    let store = setup_grouped_store(&["A", "A", "B", "B", "B", "C"]);
    let (batches, report) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);

    assert_eq!(report.converted(), 6);
    assert_eq!(report.skipped(), 0);
    assert_eq!(report.batch_labels, vec!["A", "B", "C"]);
    assert_eq!(batches.len(), 3);

    // every record opens with its comment line, in the right batch
    assert!(batches[0].text.contains("## line id: 1 |||"));
    assert!(batches[0].text.contains("## line id: 2 |||"));
    assert!(batches[1].text.contains("## line id: 3 |||"));
    assert!(batches[1].text.contains("## line id: 5 |||"));
    assert!(batches[2].text.contains("## line id: 6 |||"));
    assert!(!batches[2].text.contains("## line id: 5 |||"));

    assert_eq!(batches[0].spans.len(), 2);
    assert_eq!(batches[1].spans.len(), 3);
    assert_eq!(batches[2].spans.len(), 1);
}

#[test]
fn outbound_batches_fixed_count() {
    let config = Config::default();
    let store = setup_store_n(250);
    let (batches, report) = collect_batches(
        &store,
        &config,
        FlushPolicy::FixedCount(config.chunk_size()),
        &NewlineSegmenter,
    );

    assert_eq!(report.converted(), 250);
    assert_eq!(report.batch_labels, vec!["1-200", "201-250"]);
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].spans.len(), 200);
    assert_eq!(batches[1].spans.len(), 50);

    // counters reset on flush: the second batch restarts its id and offset space
    assert_eq!(batches[1].spans[0].id, TagId::new(1));
    assert!(batches[1].spans[0].begin < batches[1].text.chars().count());
}

#[test]
fn offsets_and_ids_grow_monotonically_within_a_batch() {
    let config = Config::default();
    let store = setup_store_n(20);
    let (batches, _) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);
    assert_eq!(batches.len(), 1);

    let spans = &batches[0].spans;
    assert_eq!(spans.len(), 20);
    for window in spans.windows(2) {
        assert!(window[0].end <= window[1].begin);
        assert!(window[0].id < window[1].id);
    }
    // every span's surface text is recoverable from the batch text
    let chars: Vec<char> = batches[0].text.chars().collect();
    for span in spans {
        let found: String = chars[span.begin..span.end].iter().collect();
        assert_eq!(found, span.text);
    }
}

#[test]
fn malformed_record_is_skipped_without_poisoning_the_batch() {
    let config = Config::default();
    let mut store = setup_store_n(5);
    store
        .get_mut(3)
        .unwrap()
        .set_str("ann", "broken <d>unclosed");

    let (batches, report) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);

    assert_eq!(report.converted(), 4);
    assert_eq!(report.skipped(), 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        RecordOutcome::Skipped { record_id, .. } if record_id == "3"
    )));

    assert_eq!(batches.len(), 1);
    assert!(!batches[0].text.contains("unclosed"));
    assert!(batches[0].text.contains("## line id: 2 |||"));
    assert!(batches[0].text.contains("## line id: 4 |||"));
    assert_eq!(batches[0].spans.len(), 4);
}

#[test]
fn illegible_records_are_skipped() {
    let config = Config::default();
    let mut store = setup_store();
    store.get_mut(2).unwrap().set_str("title", "I");

    let (batches, report) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);
    assert_eq!(report.converted(), 1);
    assert!(report.outcomes.iter().any(|o| matches!(
        o,
        RecordOutcome::Skipped { record_id, reason } if record_id == "2" && reason.contains("illegible")
    )));
    assert!(!batches[0].text.contains("## line id: 2 |||"));
}

#[test]
fn backref_attributes_never_reach_the_annotation_file() {
    let config = Config::default();
    let registry = TagRegistry::new();

    let mut store = DocumentStore::new("x");
    store.insert(
        1,
        make_record("1", "P1", "2014-01-01", "S", "<d tid=\"T9\">x</d>"),
    );
    let (batches, _) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);
    let ann = ann_to_string(&batches[0].spans, &batches[0].attrs, &registry).unwrap();
    assert!(!ann.lines().any(|l| l.starts_with('A')));

    let mut store = DocumentStore::new("x");
    store.insert(
        1,
        make_record(
            "1",
            "P1",
            "2014-01-01",
            "S",
            "<d tid=\"T9\" certainty=\"positive\">x</d>",
        ),
    );
    let (batches, _) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);
    let ann = ann_to_string(&batches[0].spans, &batches[0].attrs, &registry).unwrap();
    assert_eq!(ann.lines().filter(|l| l.starts_with('A')).count(), 1);
    assert!(ann.contains("certainty T1 positive"));
    assert!(!ann.contains("tid"));
}

#[test]
fn standoff_roundtrip_restores_the_inline_markup() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let registry = TagRegistry::new();
    let store = setup_store();

    let base = dir.path().join("out").to_string_lossy().into_owned();
    let report = store_to_standoff(
        &store,
        &registry,
        &config,
        FlushPolicy::GroupChange,
        &NewlineSegmenter,
        &base,
    )
    .unwrap();
    assert_eq!(report.batch_labels, vec!["1"]);

    let txt = fs::read_to_string(format!("{}.1.txt", base)).unwrap();
    let ann = fs::read_to_string(format!("{}.1.ann", base)).unwrap();
    assert!(txt.contains("no mass in the liver."));
    assert!(ann.contains("Disease"));
    assert!(ann.contains("Anatomical"));
    assert!(ann.contains("certainty T1 positive"));

    let mut merged = setup_store();
    let merge_report = merge_standoff(&mut merged, &txt, &ann, &registry, &config);
    assert_eq!(merge_report.merged, vec!["1", "2"]);
    assert!(merge_report.retag_error.is_none());
    assert!(merge_report.skipped_lines.is_empty());

    let record = merged.get(1).unwrap();
    assert_eq!(
        record.get_str("raw_text").as_deref(),
        Some("no mass in the liver.")
    );
    let annotated = record.get_str("ann").unwrap();
    assert_eq!(
        strip_backrefs(annotated.trim_end()),
        "no <d certainty=\"positive\">mass</d> in the <a>liver</a>."
    );

    let record = merged.get(2).unwrap();
    let annotated = record.get_str("ann").unwrap();
    assert_eq!(
        strip_backrefs(annotated.trim_end()),
        "previous <c>enlargement</c> resolved."
    );
}

#[test]
fn merge_ignores_unknown_record_ids() {
    let config = Config::default();
    let registry = TagRegistry::new();
    let mut store = setup_store();

    let txt = "## line id: 99 ||| seq: 9\nnobody claims this\n";
    let report = merge_standoff(&mut store, txt, "", &registry, &config);
    assert!(report.merged.is_empty());
    assert_eq!(report.ignored, vec!["99"]);
    assert!(store.get(1).unwrap().get_str("raw_text").is_none());
}

#[test]
fn merge_turns_dct_attributes_into_self_relations() {
    let config = Config::default();
    let registry = TagRegistry::new();
    let mut store = setup_store();

    let txt = "## line id: 1 ||| seq: 1\n2014-03-20\n";
    let ann = "T1\tTIMEX3 25 35\t2014-03-20\nA1\tDCT-Rel T1 before\n";
    let report = merge_standoff(&mut store, txt, ann, &registry, &config);
    assert!(report.retag_error.is_none());
    assert!(report.unhandled_attributes.is_empty());

    let record = store.get(1).unwrap();
    let annotated = record.get_str("ann").unwrap();
    assert!(annotated.contains("<TIMEX3 tid=\"T1\">2014-03-20</TIMEX3>"));
    assert_eq!(
        record.fields().get("rels").unwrap(),
        &serde_json::json!([{"tail": "T1", "head": "T1", "label": "before"}])
    );
}

#[test]
fn merge_reports_unhandled_attribute_keys() {
    let config = Config::default();
    let registry = TagRegistry::new();
    let mut store = setup_store();

    let txt = "## line id: 1 ||| seq: 1\nabc\n";
    let ann = "T1\tDisease 25 28\tabc\nA1\tshade T1 dark\n";
    let report = merge_standoff(&mut store, txt, ann, &registry, &config);
    assert_eq!(report.unhandled_attributes.len(), 1);
    // the attribute is dropped, the entity still renders
    let annotated = store.get(1).unwrap().get_str("ann").unwrap();
    assert!(annotated.contains("<d tid=\"T1\">abc</d>"));
}

#[test]
fn merge_with_unknown_tag_type_keeps_the_raw_text() {
    let config = Config::default();
    let registry = TagRegistry::new();
    let mut store = setup_store();

    let txt = "## line id: 1 ||| seq: 1\nabc\n";
    let ann = "T1\tBogus 25 28\tabc\n";
    let report = merge_standoff(&mut store, txt, ann, &registry, &config);
    assert!(report.retag_error.is_some());

    let record = store.get(1).unwrap();
    assert_eq!(record.get_str("raw_text").as_deref(), Some("abc"));
    // the annotated column keeps its original content
    assert!(record.get_str("ann").unwrap().contains("certainty"));
}

#[test]
fn merge_standoff_dir_picks_up_pairs_by_base_name() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let registry = TagRegistry::new();
    let store = setup_store();

    let base = dir.path().join("out").to_string_lossy().into_owned();
    store_to_standoff(
        &store,
        &registry,
        &config,
        FlushPolicy::GroupChange,
        &NewlineSegmenter,
        &base,
    )
    .unwrap();
    // an unrelated file in the same directory must not be touched
    fs::write(dir.path().join("other.1.txt"), "unrelated").unwrap();

    let mut merged = setup_store();
    let reports = merge_standoff_dir(
        &mut merged,
        &dir.path().to_string_lossy(),
        "out",
        &registry,
        &config,
    )
    .unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].0, "out.1");
    assert_eq!(reports[0].1.merged, vec!["1", "2"]);
    assert!(merged.get(1).unwrap().get_str("raw_text").is_some());
}

#[test]
fn document_store_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default();
    let store = setup_store();

    let path = dir.path().join("store.json").to_string_lossy().into_owned();
    store.to_json_file(&path, &config).unwrap();
    let reloaded = DocumentStore::from_json_file(&path, &config).unwrap();
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded.source(), "sample.csv");
    assert_eq!(
        reloaded.get(2).unwrap().get_str("date").as_deref(),
        Some("2014-03-21T00:00:00")
    );
}

#[cfg(feature = "csv")]
#[test]
fn csv_to_standoff_pipeline() {
    let config = Config::default();
    let registry = TagRegistry::new();
    let data = "seq,patient,date,title,ann\n\
                1,P1,2014-03-20,S,first <d>shadow</d> seen\n\
                1,P1,2014-03-21,S,shadow <c>unchanged</c>\n\
                2,P2,2014-04-01,S,<a>lung</a> clear\n";
    let store = read_csv(data.as_bytes(), "input.csv").unwrap();

    let (batches, report) =
        collect_batches(&store, &config, FlushPolicy::GroupChange, &NewlineSegmenter);
    assert_eq!(report.converted(), 3);
    assert_eq!(report.batch_labels, vec!["1", "2"]);
    let ann = ann_to_string(&batches[0].spans, &batches[0].attrs, &registry).unwrap();
    assert!(ann.contains("Disease"));
    assert!(ann.contains("Change"));
}

#[test]
fn bio_stream_feeds_the_detagger() {
    let bio = "shadow B-D positive\nin O _\nlung B-A _\nEOR O _\n";
    let markup = bio_to_markup(bio).unwrap();
    assert_eq!(
        markup,
        "<d certainty=\"positive\">shadow</d>in<a>lung</a>\n\n"
    );

    let wrapped = wrap_lines(None, markup.trim_end());
    let flat = flatten("1", &wrapped, BatchState::new()).unwrap();
    assert_eq!(flat.text(), "shadowinlung\n");
    assert_eq!(flat.spans.len(), 2);
    assert_eq!(flat.spans[0].text, "shadow");
    assert_eq!(flat.attrs.len(), 1);
    assert_eq!(flat.attrs[0].key, "certainty");
}
