/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! The JSON document store: a top-level mapping with a configurable container
//! key holding stringified sequential record ids mapped to record objects.
//! Records carry the arbitrary column/value pairs of the originating
//! spreadsheet, plus the fields this crate injects on merge-back (raw text,
//! annotated text, relations).
//!
//! Records are created from spreadsheet rows or loaded from an existing store,
//! mutated in place when annotations are merged back, and never deleted.

use std::collections::BTreeMap;
use std::io::Write;

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::error::AnnError;
use crate::file::{open_file_writer, read_to_string};
use crate::types::Relation;

/// One clinical report/record: an ordered bag of column/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn contains(&self, column: &str) -> bool {
        self.fields.contains_key(column)
    }

    /// Returns a column value as a string. Numbers and booleans are
    /// stringified (spreadsheet cells arrive untyped), nulls and missing
    /// columns yield `None`.
    pub fn get_str(&self, column: &str) -> Option<String> {
        match self.fields.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.fields.insert(column.into(), value);
    }

    pub fn set_str(&mut self, column: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(column.into(), Value::String(value.into()));
    }

    /// Stores the relation list under the configured relations key
    pub fn set_relations(&mut self, column: impl Into<String>, relations: &[Relation]) {
        let value = serde_json::to_value(relations).unwrap_or(Value::Null);
        self.fields.insert(column.into(), value);
    }
}

/// Returns the date part of a column value as an ISO-8601 date string. Date
/// columns may hold a plain date or a full datetime; either way only the date
/// part travels in comment lines and file labels.
pub fn date_part(raw: &str) -> String {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return datetime.date().format("%Y-%m-%d").to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format("%Y-%m-%d").to_string();
    }
    // unrecognised format: at least drop a trailing time part
    raw.split('T').next().unwrap_or(raw).to_string()
}

/// The document store: records keyed by their sequential id.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    /// Name of the originating source (usually the spreadsheet file name)
    source: String,
    records: BTreeMap<u32, Record>,
}

impl DocumentStore {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            records: BTreeMap::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn insert(&mut self, id: u32, record: Record) {
        self.records.insert(id, record);
    }

    pub fn get(&self, id: u32) -> Option<&Record> {
        self.records.get(&id)
    }

    pub fn get_mut(&mut self, id: u32) -> Option<&mut Record> {
        self.records.get_mut(&id)
    }

    /// Looks a record up by its stringified id, as found in comment lines.
    /// Unparseable ids resolve to `None` (and are thus ignored by merges).
    pub fn get_mut_by_str(&mut self, id: &str) -> Option<&mut Record> {
        let id: u32 = id.parse().ok()?;
        self.records.get_mut(&id)
    }

    /// Iterates over records in ascending id order
    pub fn records(&self) -> impl Iterator<Item = (u32, &Record)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serializes the store to a JSON value under the configured container key
    pub fn to_json_value(&self, config: &Config) -> Value {
        let mut container = Map::new();
        for (id, record) in &self.records {
            container.insert(id.to_string(), Value::Object(record.fields.clone()));
        }
        let mut top = Map::new();
        top.insert("source".to_string(), Value::String(self.source.clone()));
        top.insert(config.container_key().to_string(), Value::Object(container));
        Value::Object(top)
    }

    /// Serializes the store to a pretty-printed JSON string
    pub fn to_json_string(&self, config: &Config) -> Result<String, AnnError> {
        serde_json::to_string_pretty(&self.to_json_value(config))
            .map_err(|e| AnnError::SerializationError(format!("Writing document store: {}", e)))
    }

    /// Writes the store to a JSON file
    pub fn to_json_file(&self, filename: &str, config: &Config) -> Result<(), AnnError> {
        let mut writer = open_file_writer(filename, config)?;
        let json = self.to_json_string(config)?;
        writer.write_all(json.as_bytes()).map_err(|e| {
            AnnError::IOError(e, filename.to_string(), "Writing document store failed")
        })
    }

    /// Parses a store from a JSON string
    pub fn from_json_str(json: &str, source: &str, config: &Config) -> Result<Self, AnnError> {
        let deserializer = &mut serde_json::Deserializer::from_str(json);
        let value: Value = serde_path_to_error::deserialize(deserializer).map_err(|e| {
            AnnError::JsonError(e, source.to_string(), "Reading document store JSON")
        })?;
        let top = value.as_object().ok_or(AnnError::SerializationError(
            "document store must be a JSON object".to_string(),
        ))?;
        let container = top
            .get(config.container_key())
            .and_then(|v| v.as_object())
            .ok_or_else(|| {
                AnnError::SerializationError(format!(
                    "document store has no {:?} container",
                    config.container_key()
                ))
            })?;
        let mut store = Self::new(
            top.get("source")
                .and_then(|v| v.as_str())
                .unwrap_or(source),
        );
        for (key, value) in container {
            let id: u32 = key.parse().map_err(|_| {
                AnnError::SerializationError(format!("record id {:?} is not numeric", key))
            })?;
            let fields = value
                .as_object()
                .ok_or_else(|| {
                    AnnError::SerializationError(format!("record {} is not a JSON object", id))
                })?
                .clone();
            store.insert(id, Record::from_fields(fields));
        }
        Ok(store)
    }

    /// Loads a store from a JSON file
    pub fn from_json_file(filename: &str, config: &Config) -> Result<Self, AnnError> {
        let json = read_to_string(filename, config)?;
        Self::from_json_str(&json, filename, config)
    }
}
