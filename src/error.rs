/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! This module defines [`AnnError`], the unified error type of this crate.

use std::error::Error;
use std::fmt;

// ------------------------------ ERROR DEFINITIONS & IMPLEMENTATIONS -------------------------------------------------------------

#[derive(Debug)]
pub enum AnnError {
    /// An I/O error, carries the filename and extra contextual information
    IOError(std::io::Error, String, &'static str),

    /// Error during JSON (de)serialization of the document store, carries the filename and extra contextual information
    JsonError(
        serde_path_to_error::Error<serde_json::Error>,
        String,
        &'static str,
    ),

    /// Error while reading spreadsheet rows
    #[cfg(feature = "csv")]
    CsvError(csv::Error, String, &'static str),

    /// Error during serialization
    SerializationError(String),

    /// Inline markup that still fails to parse after sanitization. The offending
    /// record is skipped, the batch continues.
    MalformedMarkup {
        record_id: String,
        message: String,
        markup: String,
    },

    /// A tag span's recorded surface text does not match the flat-stream substring
    /// at its offsets. Indicates an offset-accounting bug; the affected record is
    /// excluded from the batch rather than emitting corrupt standoff data.
    OffsetIntegrity {
        record_id: String,
        tag_id: String,
        expected: String,
        found: String,
    },

    /// A tag type absent from the registry was encountered during re-tagging
    UnknownTagType(String, &'static str),

    /// An annotation line (brat `.ann` or BIO token line) that can not be parsed
    AnnLine(String, &'static str),

    OtherError(&'static str),
}

impl From<&AnnError> for String {
    /// Returns the error message as a String
    fn from(error: &AnnError) -> String {
        match error {
            AnnError::IOError(err, filename, msg) => {
                format!("IOError: {} (file: {}, {})", err, filename, msg)
            }
            AnnError::JsonError(err, filename, msg) => {
                format!("JsonError: {} (file: {}, {})", err, filename, msg)
            }
            #[cfg(feature = "csv")]
            AnnError::CsvError(err, filename, msg) => {
                format!("CsvError: {} (file: {}, {})", err, filename, msg)
            }
            AnnError::SerializationError(msg) => format!("SerializationError: {}", msg),
            AnnError::MalformedMarkup {
                record_id,
                message,
                markup,
            } => format!(
                "MalformedMarkup: record {}: {} (markup: {})",
                record_id, message, markup
            ),
            AnnError::OffsetIntegrity {
                record_id,
                tag_id,
                expected,
                found,
            } => format!(
                "OffsetIntegrity: record {}, tag {}: surface text {:?} does not match flat stream {:?}",
                record_id, tag_id, expected, found
            ),
            AnnError::UnknownTagType(tag, msg) => {
                format!("UnknownTagType: {} ({})", tag, msg)
            }
            AnnError::AnnLine(line, msg) => format!("AnnLine: {:?} ({})", line, msg),
            AnnError::OtherError(msg) => format!("OtherError: {}", msg),
        }
    }
}

impl fmt::Display for AnnError {
    /// Formats the error message for printing
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let errmsg: String = String::from(self);
        write!(f, "[AnnError] {}", errmsg)
    }
}

impl Error for AnnError {}
