//! # ZotNotes Parser
//!
//! Turns the raw HTML note blobs of a Zotero export into ordered
//! [`AnnotationRecord`] sequences.
//!
//! Three annotation dialects exist in the wild, each with its own parser:
//!
//! - **Zotero** native PDF-reader exports: `<span class="highlight">`
//!   markup with percent-encoded annotation JSON ([`parse_zotero_note`])
//! - **Zotfile** legacy exports: quoted paragraphs with trailing
//!   citations and `zotero://open-pdf` anchors ([`parse_zotfile_note`])
//! - **User notes** written by hand in Zotero ([`parse_user_note`])
//!
//! [`detect_source`] picks the dialect from content signatures, and
//! [`parse_note`] dispatches on it:
//!
//! ```
//! use zotnotes_core::{ExtractionSource, ImportConfig};
//! use zotnotes_parser::{detect_source, parse_note};
//!
//! let note = r#"<p>"A sentence" (<a href="zotero://open-pdf/library/items/K?page=3">Smith, 2020, p. 3</a>)</p>"#;
//! assert_eq!(detect_source(note), ExtractionSource::Zotfile);
//!
//! let config = ImportConfig::default();
//! let (source, records) = parse_note(note, &config);
//! assert_eq!(source, ExtractionSource::Zotfile);
//! assert_eq!(records[0].highlight_text, "A sentence");
//! ```
//!
//! Parsing never fails: a fragment whose structured fields are missing or
//! malformed becomes a record with empty fields, not an error.

mod directive;
mod text;
mod usernote;
mod zotero;
mod zotfile;

pub use directive::classify;
pub use text::{
    collapse_cjk_spaces, decode_entities, decode_percent_escapes, normalize_backticks,
    strip_html_tags, trim_quotes,
};
pub use usernote::parse_user_note;
pub use zotero::parse_zotero_note;
pub use zotfile::parse_zotfile_note;

use zotnotes_core::{AnnotationRecord, ExtractionSource, ImportConfig};

/// Identify which exporter produced a note blob from its content signature.
pub fn detect_source(note: &str) -> ExtractionSource {
    let decoded = decode_percent_escapes(note);
    if decoded.contains("<span class=") {
        ExtractionSource::Zotero
    } else if decoded.contains(r#"<a href="zotero://open-pdf/library/"#) {
        ExtractionSource::Zotfile
    } else if decoded.contains("div data-schema-version") {
        ExtractionSource::UserNote
    } else {
        ExtractionSource::Other
    }
}

/// Detect the source of a note blob and run the matching parser.
pub fn parse_note(note: &str, config: &ImportConfig) -> (ExtractionSource, Vec<AnnotationRecord>) {
    let source = detect_source(note);
    let records = match source {
        ExtractionSource::Zotero => parse_zotero_note(note, config),
        ExtractionSource::Zotfile => parse_zotfile_note(note, config),
        ExtractionSource::UserNote | ExtractionSource::Other => parse_user_note(note, source),
    };
    log::debug!("parsed {} records from a {:?} note", records.len(), source);
    (source, records)
}

/// Convenient prelude for common imports.
pub mod prelude {
    pub use crate::{
        classify, detect_source, parse_note, parse_user_note, parse_zotero_note,
        parse_zotfile_note,
    };
    pub use zotnotes_core::{AnnotationKind, AnnotationRecord, ExtractionSource};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_zotero() {
        let note = r#"<p><span class="highlight">x</span></p>"#;
        assert_eq!(detect_source(note), ExtractionSource::Zotero);
    }

    #[test]
    fn test_detect_zotfile() {
        let note = r#"<p><a href="zotero://open-pdf/library/items/K?page=1">1</a></p>"#;
        assert_eq!(detect_source(note), ExtractionSource::Zotfile);
    }

    #[test]
    fn test_detect_user_note() {
        let note = r#"<div data-schema-version="8"><p>thoughts</p></div>"#;
        assert_eq!(detect_source(note), ExtractionSource::UserNote);
    }

    #[test]
    fn test_detect_other() {
        assert_eq!(detect_source("just some text"), ExtractionSource::Other);
    }

    #[test]
    fn test_zotero_signature_wins_over_schema_marker() {
        // reader exports are wrapped in the schema div too
        let note = r#"<div data-schema-version="8"><p><span class="highlight">x</span></p></div>"#;
        assert_eq!(detect_source(note), ExtractionSource::Zotero);
    }

    #[test]
    fn test_parse_note_dispatch() {
        let config = ImportConfig::default();
        let (source, records) = parse_note("free-form text", &config);
        assert_eq!(source, ExtractionSource::Other);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].row_edited, "free-form text");
    }
}
