//! Parser for notes exported by Zotero's native PDF reader.
//!
//! One exported note is a single HTML blob. Each highlight is a paragraph
//! carrying a `<span class="highlight">` with a JSON `data-annotation`
//! attribute; the structured fields (colour, page, attachment URI,
//! annotation key) are probed independently in the raw fragment so a
//! missing field never aborts the line.

use crate::directive;
use crate::text::{
    collapse_cjk_spaces, decode_entities, decode_percent_escapes, strip_html_tags, trim_quotes,
};
use lazy_static::lazy_static;
use regex::Regex;
use zotnotes_core::{AnnotationKind, AnnotationRecord, ExtractionSource, ImportConfig};

lazy_static! {
    /// Fragment boundaries: exported headings and paragraphs
    static ref FRAGMENT_SPLIT: Regex = Regex::new(r"</h1>|</p>|<h1>").unwrap();
    /// Attachment key of an embedded image
    static ref IMAGE_KEY: Regex = Regex::new(r#"key="([^"]*)""#).unwrap();
    /// Highlight colour inside the annotation JSON
    static ref COLOUR: Regex = Regex::new(r##""color":"(#[0-9a-fA-F]{6})""##).unwrap();
    /// 0-based page index inside the PDF
    static ref PAGE_INDEX: Regex = Regex::new(r#""pageIndex":(\d+)"#).unwrap();
    /// Author-facing page label (numeric labels only)
    static ref PAGE_LABEL: Regex = Regex::new(r#""pageLabel":"(\d+)"#).unwrap();
    /// Attachment URI for synced libraries
    static ref URI_SYNCED: Regex =
        Regex::new(r#"attachmentURI":"http://zotero\.org/users/\d+/items/(\w+)"#).unwrap();
    /// Attachment URI for purely local libraries
    static ref URI_LOCAL: Regex = Regex::new(
        r#""attachmentURI":"http://zotero\.org/users/local/[a-zA-Z0-9]*/items/([a-zA-Z0-9]*)"#
    )
    .unwrap();
    /// Fallback: the annotation's own URI list
    static ref URI_LIST: Regex =
        Regex::new(r#""uris":\["http://zotero\.org/users/\d+/items/(\w+)"#).unwrap();
    /// Key of the annotation itself
    static ref ANNOTATION_KEY: Regex = Regex::new(r#""annotationKey":"([a-zA-Z0-9]+)"#).unwrap();
    /// Parenthesized citation marker, e.g. `(<span class="citation-item">Smith, 2020, p. 12</span>)</span>`
    static ref CITATION: Regex =
        Regex::new(r#"\(<span class="citation-item">(.*)</span>\)</span>"#).unwrap();
}

fn capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Parse one Zotero-reader note blob into annotation records.
pub fn parse_zotero_note(note: &str, config: &ImportConfig) -> Vec<AnnotationRecord> {
    let note = note
        .replace('`', "'")
        .replace(", p. p. ", ", p. ");
    let note = note.trim();

    let mut records = Vec::new();

    // The text before the first boundary is the exporter preamble; skip it.
    for fragment in FRAGMENT_SPLIT.split(note).skip(1) {
        // The annotation JSON in data-annotation attributes is
        // percent-encoded; every probe runs on the decoded fragment.
        let decoded = decode_percent_escapes(fragment);
        let raw_fragment = decoded.as_str();
        let clean = decode_entities(&strip_html_tags(raw_fragment));
        let mut record = AnnotationRecord::new(ExtractionSource::Zotero, clean.as_str());

        if raw_fragment.contains("data-attachment-key=") {
            record.kind = AnnotationKind::Image;
            record.image_path = capture(&IMAGE_KEY, raw_fragment).unwrap_or("").to_string();
        }

        if let Some(colour) = capture(&COLOUR, raw_fragment) {
            record.highlight_colour = colour.to_string();
        }
        if let Some(page) = capture(&PAGE_INDEX, raw_fragment) {
            // pageIndex is 0-based
            record.page_in_pdf = page.parse::<u32>().ok().map(|p| p + 1);
        }
        if let Some(label) = capture(&PAGE_LABEL, raw_fragment) {
            record.page_label = label.parse::<u32>().ok();
        }

        if let Some(uri) = capture(&URI_SYNCED, raw_fragment) {
            record.attachment_uri = uri.to_string();
        }
        if let Some(uri) = capture(&URI_LOCAL, raw_fragment) {
            record.attachment_uri = uri.to_string();
        }
        if record.attachment_uri.is_empty() {
            if let Some(uri) = capture(&URI_LIST, raw_fragment) {
                record.attachment_uri = uri.to_string();
            }
        }
        if let Some(key) = capture(&ANNOTATION_KEY, raw_fragment) {
            record.annotation_key = key.to_string();
        }
        record.backlink = record.build_backlink().unwrap_or_default();

        if let Some(inner) = capture(&CITATION, raw_fragment) {
            record.cite_key = format!("({})", inner);
        }

        match find_citation(&clean, &record.cite_key) {
            Some(pos) => {
                let end = pos + record.cite_key.len();

                let highlight = clean[..pos].trim();
                let highlight = collapse_cjk_spaces(highlight);
                record.highlight_text = trim_quotes(&highlight);

                let comment_all = clean[end..].trim().to_string();
                split_comment(&mut record, &comment_all, config);
            }
            None => {
                // No citation marker: carry the cleaned fragment through
                record.row_edited = clean.clone();
            }
        }

        records.push(record);
    }

    records
}

fn find_citation(clean: &str, cite_key: &str) -> Option<usize> {
    if cite_key.is_empty() {
        return None;
    }
    clean.find(cite_key)
}

/// Classify the comment, strip the directive token, and slice out the
/// inline tag block.
fn split_comment(record: &mut AnnotationRecord, comment_all: &str, config: &ImportConfig) {
    let first_blank = comment_all.find(' ');
    let first_word = first_blank.map(|i| &comment_all[..i]).unwrap_or("");

    if record.kind != AnnotationKind::Image {
        record.kind = directive::classify(first_word, comment_all, config);
    }

    record.comment_text = match record.kind {
        AnnotationKind::Plain | AnnotationKind::Image => comment_all.to_string(),
        _ => comment_all[first_blank.unwrap_or(comment_all.len())..]
            .trim()
            .to_string(),
    };

    extract_inline_tags(record, config);
}

/// Slice the configured tag block out of the comment and split it into
/// individual tag tokens. The block runs from the begin marker to the last
/// end marker, or to the end of the comment when no end marker is set.
fn extract_inline_tags(record: &mut AnnotationRecord, config: &ImportConfig) {
    if config.tag_begin.is_empty() || !record.comment_text.contains(&config.tag_begin) {
        return;
    }

    let start = match record.comment_text.find(&config.tag_begin) {
        Some(i) => i,
        None => return,
    };
    let end = if config.tag_end.is_empty() {
        record.comment_text.len()
    } else {
        record
            .comment_text
            .rfind(&config.tag_end)
            .filter(|&i| i >= start)
            .unwrap_or(start)
    };
    record.inline_tags_text = record.comment_text[start..end].to_string();
    if record.inline_tags_text.is_empty() {
        return;
    }

    record.comment_text = record
        .comment_text
        .replace(&record.inline_tags_text, "")
        .trim()
        .to_string();

    let mut block = record.inline_tags_text.replacen(&config.tag_begin, "", 1);
    if !config.tag_end.is_empty() {
        block = block.replacen(&config.tag_end, "", 1);
    }
    record.inline_tags = block
        .split(&config.tag_divider)
        .map(|t| t.to_string())
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImportConfig {
        ImportConfig::default()
    }

    fn highlight_fragment() -> String {
        // data-annotation carries the percent-encoded JSON:
        // {"attachmentURI":"http://zotero.org/users/123/items/ATT4CHMT",
        //  "annotationKey":"ANNKEY99","color":"#ffd400",
        //  "pageLabel":"12","pageIndex":11}
        concat!(
            "<p>Annotations</p>",
            "<p><span class=\"highlight\" data-annotation=\"",
            "%7B%22attachmentURI%22%3A%22http%3A%2F%2Fzotero.org%2Fusers%2F123%2Fitems%2FATT4CHMT%22%2C",
            "%22annotationKey%22%3A%22ANNKEY99%22%2C%22color%22%3A%22%23ffd400%22%2C",
            "%22pageLabel%22%3A%2212%22%2C%22pageIndex%22%3A11%7D\">",
            "“Some highlighted sentence”</span> ",
            "(<span class=\"citation-item\">Smith, 2020, p. 12</span>)</span> ",
            "todo check the proof Tag: machine learning; nlp</p>"
        )
        .to_string()
    }

    #[test]
    fn test_highlight_line_is_fully_extracted() {
        let records = parse_zotero_note(&highlight_fragment(), &config());
        // the <p>preamble</p> split yields the preamble and a trailing
        // empty fragment around the annotation line
        let record = records
            .iter()
            .find(|r| !r.highlight_text.is_empty())
            .expect("annotation record");

        assert_eq!(record.highlight_text, "Some highlighted sentence");
        assert_eq!(record.highlight_colour, "#ffd400");
        assert_eq!(record.page_in_pdf, Some(12)); // pageIndex + 1
        assert_eq!(record.page_label, Some(12));
        assert_eq!(record.attachment_uri, "ATT4CHMT");
        assert_eq!(record.annotation_key, "ANNKEY99");
        assert_eq!(record.cite_key, "(Smith, 2020, p. 12)");
        assert_eq!(
            record.backlink,
            "zotero://open-pdf/library/items/ATT4CHMT?page=12&annotation=ANNKEY99"
        );
    }

    #[test]
    fn test_directive_and_tags_are_stripped_from_comment() {
        let records = parse_zotero_note(&highlight_fragment(), &config());
        let record = records
            .iter()
            .find(|r| !r.highlight_text.is_empty())
            .unwrap();

        assert_eq!(record.kind, AnnotationKind::Task);
        assert_eq!(record.comment_text, "check the proof");
        // default divider is "; ", so the space is consumed by the split
        assert_eq!(record.inline_tags, vec!["machine learning", "nlp"]);
    }

    #[test]
    fn test_image_fragment() {
        let note = concat!(
            "<p>head</p>",
            "<p><img data-attachment-key=\"ABC123\" ",
            r#"data-annotation="{&quot;pageIndex&quot;:3}"/></p>"#
        );
        let records = parse_zotero_note(note, &config());
        let image = records
            .iter()
            .find(|r| r.kind == AnnotationKind::Image)
            .expect("image record");
        assert_eq!(image.image_path, "ABC123");
    }

    #[test]
    fn test_tag_block_bounded_by_end_marker() {
        let mut cfg = config();
        cfg.tag_begin = "kw: ".to_string();
        cfg.tag_end = ".".to_string();
        cfg.tag_divider = ";".to_string();

        let mut record = AnnotationRecord::new(ExtractionSource::Zotero, "");
        record.comment_text = "see kw: machine learning; nlp. later".to_string();
        extract_inline_tags(&mut record, &cfg);

        assert_eq!(record.inline_tags, vec!["machine learning", " nlp"]);
        // the end marker itself stays in the comment
        assert_eq!(record.comment_text, "see . later");
    }

    #[test]
    fn test_tag_block_to_end_of_comment() {
        let mut cfg = config();
        cfg.tag_begin = "kw: ".to_string();
        cfg.tag_end = String::new();
        cfg.tag_divider = ";".to_string();

        let mut record = AnnotationRecord::new(ExtractionSource::Zotero, "");
        record.comment_text = "kw: machine learning; nlp".to_string();
        extract_inline_tags(&mut record, &cfg);

        assert_eq!(record.inline_tags, vec!["machine learning", " nlp"]);
        assert_eq!(record.comment_text, "");
    }

    #[test]
    fn test_fragment_without_citation_is_carried_through() {
        let note = "<h1>Annotations</h1><p>stray paragraph</p>";
        let records = parse_zotero_note(note, &config());
        assert!(records.iter().any(|r| r.row_edited == "Annotations"));
        assert!(records.iter().any(|r| r.row_edited == "stray paragraph"));
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let note = "<p>x</p><p>plain text paragraph</p>";
        let records = parse_zotero_note(note, &config());
        for record in &records {
            assert_eq!(record.highlight_colour, "");
            assert_eq!(record.page_in_pdf, None);
            assert_eq!(record.backlink, "");
        }
    }
}
