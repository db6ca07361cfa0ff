//! Parser for annotations extracted by the legacy Zotfile tool.
//!
//! Zotfile writes one paragraph per annotation: the quoted highlight, a
//! trailing parenthesized citation, and a `zotero://open-pdf` anchor.
//! Comments appear as separate "note on page" paragraphs; a directive
//! expressed as such a stand-alone trailing paragraph is folded back onto
//! the highlight before it.

use crate::directive;
use crate::text::{strip_html_tags, trim_quotes};
use lazy_static::lazy_static;
use regex::Regex;
use zotnotes_core::{AnnotationRecord, ExtractionSource, ImportConfig};

lazy_static! {
    /// Trailing parenthesized citation, e.g. `(Smith, 2020, p. 12)`
    static ref CITE_TRAILING: Regex = Regex::new(r"\([^)]+\)+$").unwrap();
    /// Fallback citation shape with an embedded page number
    static ref CITE_PAGED: Regex = Regex::new(r"\([^D+]+ \d+\S+\)").unwrap();
    /// Zotfile deep link into the PDF
    static ref BACKLINK: Regex =
        Regex::new(r"zotero://open-pdf/library/items/\S+page=\d+").unwrap();
    static ref NUMBER: Regex = Regex::new(r"\d+").unwrap();
}

/// Marker Zotfile puts on comment paragraphs
const NOTE_ON_PAGE: &str = "(note on page:";

/// Parse one Zotfile note blob into annotation records.
pub fn parse_zotfile_note(note: &str, config: &ImportConfig) -> Vec<AnnotationRecord> {
    let mut records: Vec<AnnotationRecord> = Vec::new();

    for raw_fragment in note.split("<p>") {
        let clean = strip_html_tags(raw_fragment);
        if clean.is_empty() {
            continue;
        }

        let mut record = AnnotationRecord::new(ExtractionSource::Zotfile, clean.as_str());

        record.cite_key = CITE_TRAILING
            .find(&clean)
            .or_else(|| CITE_PAGED.find(&clean))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        let mut extracted = String::new();
        if !record.cite_key.is_empty() {
            if let Some(pos) = clean.find(&record.cite_key) {
                extracted = trim_quotes(clean[..pos].trim());
            }
        }

        if let Some(m) = BACKLINK.find(raw_fragment) {
            record.backlink = m.as_str().to_string();
        }

        // The page label is the last number in the untouched fragment
        record.page_label = NUMBER
            .find_iter(raw_fragment)
            .last()
            .and_then(|m| m.as_str().parse::<u32>().ok());

        if record.cite_key.contains(NOTE_ON_PAGE) {
            record.comment_text = extracted;
            record.cite_key.clear();
        } else {
            record.highlight_text = extracted;
        }

        if !record.comment_text.is_empty() {
            let first_blank = record
                .comment_text
                .find(' ')
                .unwrap_or(record.comment_text.len());
            let first_word = record.comment_text[..first_blank].to_string();
            record.kind = directive::classify(&first_word, &record.comment_text, config);
            if record.kind.is_directive() {
                record.comment_text = record.comment_text[first_blank..].trim().to_string();
            }
        }

        // A directive in a stand-alone trailing fragment applies to the
        // previous highlight: move it there and drop this record.
        if record.kind.is_directive() {
            if let Some(previous) = records.last_mut() {
                if !previous.kind.is_directive() && previous.comment_text.is_empty() {
                    previous.kind = record.kind;
                    previous.comment_text = record.comment_text.clone();
                    continue;
                }
            }
        }

        records.push(record);
    }

    records
}
