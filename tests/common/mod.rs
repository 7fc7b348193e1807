#![allow(dead_code)]
use reportann::*;

/// Builds one spreadsheet-shaped record
pub fn make_record(seq: &str, patient: &str, date: &str, title: &str, ann: &str) -> Record {
    let mut record = Record::new();
    record.set_str("seq", seq);
    record.set_str("patient", patient);
    record.set_str("date", date);
    record.set_str("title", title);
    record.set_str("ann", ann);
    record
}

/// A small store with two annotated reports in one group
pub fn setup_store() -> DocumentStore {
    let mut store = DocumentStore::new("sample.csv");
    store.insert(
        1,
        make_record(
            "1",
            "P0017",
            "2014-03-20T00:00:00",
            "S",
            "no <d certainty=\"positive\">mass</d> in the <a>liver</a>.",
        ),
    );
    store.insert(
        2,
        make_record(
            "1",
            "P0017",
            "2014-03-21T00:00:00",
            "S",
            "previous <c>enlargement</c> resolved.",
        ),
    );
    store
}

/// A store with `n` single-line records, all in the same group
pub fn setup_store_n(n: u32) -> DocumentStore {
    let mut store = DocumentStore::new("bulk.csv");
    for id in 1..=n {
        store.insert(
            id,
            make_record(
                "1",
                "P0001",
                "2014-01-01",
                "S",
                &format!("report {} shows a <d>lesion</d>.", id),
            ),
        );
    }
    store
}

/// A store whose records carry the given group ids, in id order
pub fn setup_grouped_store(groups: &[&str]) -> DocumentStore {
    let mut store = DocumentStore::new("grouped.csv");
    for (index, group) in groups.iter().enumerate() {
        let id = index as u32 + 1;
        store.insert(
            id,
            make_record(
                group,
                "P0002",
                "2014-02-02",
                "S",
                &format!("finding <f>number {}</f>.", id),
            ),
        );
    }
    store
}

/// Strips the back-reference attributes that re-tagging always inserts, for
/// comparisons against the original inline markup
pub fn strip_backrefs(markup: &str) -> String {
    let pattern = regex::Regex::new(r#" tid="T\d+""#).unwrap();
    pattern.replace_all(markup, "").into_owned()
}
