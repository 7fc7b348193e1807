/*
    Reportann (clinical report annotation transcoder)

    Licensed under the GNU General Public License v3
*/

//! Inbound conversion from the BIO token format to inline markup.
//!
//! Input is whitespace-separated `token bio_tag certainty_tag` triples, one
//! per line, with the sentinel token `EOR` marking the end of a record. Each
//! record becomes one line of inline markup followed by a blank separator
//! line. The certainty tag is rendered as a `certainty` attribute unless it
//! is the placeholder `_`. Subword continuation markers (`#`) are stripped
//! from the final record string.

use crate::error::AnnError;

/// End-of-record sentinel token
pub const EOR: &str = "EOR";

/// Converts a whole BIO token stream to inline markup, one record per line
/// with blank separator lines.
pub fn bio_to_markup(input: &str) -> Result<String, AnnError> {
    let mut out = String::new();
    let mut record = String::new();
    // the short tag code of the currently open element, if any
    let mut open: Option<String> = None;

    for line in input.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [token, bio_tag, cert_tag] = fields.as_slice() else {
            return Err(AnnError::AnnLine(
                line.to_string(),
                "BIO line needs token, bio tag and certainty tag",
            ));
        };

        if *token == EOR {
            if let Some(code) = open.take() {
                close_tag(&mut record, &code);
            }
            out.push_str(&record.replace('#', ""));
            out.push('\n');
            out.push('\n');
            record.clear();
            continue;
        }

        let code = label_code(bio_tag);
        match bio_tag.chars().next() {
            Some('B') => {
                if let Some(previous) = open.take() {
                    close_tag(&mut record, &previous);
                }
                open_tag(&mut record, &code, Some(cert_tag));
                record.push_str(token);
                open = Some(code);
            }
            Some('I') => match open.take() {
                Some(previous) if previous != code => {
                    close_tag(&mut record, &previous);
                    open_tag(&mut record, &code, None);
                    record.push_str(token);
                    open = Some(code);
                }
                Some(previous) => {
                    record.push_str(token);
                    open = Some(previous);
                }
                None => {
                    open_tag(&mut record, &code, None);
                    record.push_str(token);
                    open = Some(code);
                }
            },
            _ => {
                if let Some(previous) = open.take() {
                    close_tag(&mut record, &previous);
                }
                record.push_str(token);
            }
        }
    }

    // a trailing record without an EOR sentinel is still flushed
    if !record.is_empty() {
        if let Some(code) = open.take() {
            close_tag(&mut record, &code);
        }
        out.push_str(&record.replace('#', ""));
        out.push('\n');
        out.push('\n');
    }
    Ok(out)
}

/// The lowercased tag code of a BIO label: the part after the `B-`/`I-` prefix
fn label_code(bio_tag: &str) -> String {
    bio_tag
        .rsplit('-')
        .next()
        .unwrap_or(bio_tag)
        .to_lowercase()
}

fn open_tag(record: &mut String, code: &str, certainty: Option<&str>) {
    record.push('<');
    record.push_str(code);
    if let Some(cert) = certainty {
        if cert != "_" {
            record.push_str(" certainty=\"");
            record.push_str(cert);
            record.push('"');
        }
    }
    record.push('>');
}

fn close_tag(record: &mut String, code: &str) {
    record.push_str("</");
    record.push_str(code);
    record.push('>');
}
