/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! Spreadsheet ingestion: reads CSV rows into a fresh [`DocumentStore`].
//! The header row provides the column names; records are keyed by their
//! 1-based row index, matching the sequential ids the rest of the pipeline
//! expects. Missing cells become empty strings, mirroring how the source
//! spreadsheets are filled.

use std::io::Read;
use std::path::Path;

use serde_json::Value;

use crate::config::Config;
use crate::error::AnnError;
use crate::file::open_file_reader;
use crate::store::{DocumentStore, Record};

/// Reads CSV from any reader into a document store. `source` names the
/// originating file for the store's own metadata.
pub fn read_csv<R: Read>(reader: R, source: &str) -> Result<DocumentStore, AnnError> {
    let mut csv_reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = csv_reader
        .headers()
        .map_err(|e| AnnError::CsvError(e, source.to_string(), "Reading CSV header row"))?
        .clone();

    let source_name = Path::new(source)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.to_string());
    let mut store = DocumentStore::new(source_name);

    for (index, row) in csv_reader.records().enumerate() {
        let row = row.map_err(|e| AnnError::CsvError(e, source.to_string(), "Reading CSV row"))?;
        let mut record = Record::new();
        for (column, header) in headers.iter().enumerate() {
            let cell = row.get(column).unwrap_or("");
            record.set(header, Value::String(cell.to_string()));
        }
        store.insert(index as u32 + 1, record);
    }
    Ok(store)
}

/// Reads a CSV file into a document store
pub fn read_csv_file(filename: &str, config: &Config) -> Result<DocumentStore, AnnError> {
    let reader = open_file_reader(filename, config)?;
    read_csv(reader, filename)
}
