//! Parser for notes written by hand in Zotero.
//!
//! User notes carry no annotation structure: the blob is split on heading
//! and paragraph boundaries, entities are decoded, and every fragment is
//! carried through as its own record. No directive classification and no
//! structured-field extraction happen here.

use crate::text::{decode_entities, decode_percent_escapes, normalize_backticks};
use lazy_static::lazy_static;
use regex::Regex;
use zotnotes_core::{AnnotationRecord, ExtractionSource};

lazy_static! {
    static ref FRAGMENT_SPLIT: Regex = Regex::new(r"</h1>|\n\n|</p>").unwrap();
}

/// Parse a hand-written note blob into plain-text records. `source` is
/// either [`ExtractionSource::UserNote`] or [`ExtractionSource::Other`].
pub fn parse_user_note(note: &str, source: ExtractionSource) -> Vec<AnnotationRecord> {
    let note = note
        .replace('`', "'")
        .replace(", p. p. ", ", p. ");
    let note = note.trim();

    FRAGMENT_SPLIT
        .split(note)
        .map(|fragment| {
            let line = decode_percent_escapes(fragment);
            let line = normalize_backticks(&line);
            let line = decode_entities(&line);
            AnnotationRecord::new(source, line)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_on_paragraphs_and_blank_lines() {
        let note = "<div data-schema-version=\"8\"><p>First thought</p><p>Second thought</p></div>";
        let records = parse_user_note(note, ExtractionSource::UserNote);
        let texts: Vec<&str> = records.iter().map(|r| r.row_edited.as_str()).collect();
        assert!(texts.contains(&"<div data-schema-version=\"8\"><p>First thought"));
        assert!(texts.contains(&"<p>Second thought"));
    }

    #[test]
    fn test_entities_and_backticks_normalized() {
        let note = "<p>Smith &amp; Jones on `grep`</p>";
        let records = parse_user_note(note, ExtractionSource::UserNote);
        assert_eq!(records[0].row_edited, "<p>Smith & Jones on 'grep'");
    }

    #[test]
    fn test_records_keep_source_tag() {
        let records = parse_user_note("plain text", ExtractionSource::Other);
        assert!(records
            .iter()
            .all(|r| r.source == ExtractionSource::Other));
    }

    #[test]
    fn test_row_original_matches_row_edited() {
        let records = parse_user_note("<p>one</p>\n\ntwo", ExtractionSource::UserNote);
        for record in &records {
            assert_eq!(record.row_original, record.row_edited);
        }
    }
}
