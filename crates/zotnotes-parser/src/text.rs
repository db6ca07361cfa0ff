//! Text cleanup shared by the source parsers.

use lazy_static::lazy_static;
use regex::Regex;
use std::borrow::Cow;

lazy_static! {
    /// Any opening or closing HTML tag (also matches a tag cut off at
    /// end-of-fragment, which the paragraph split produces)
    static ref HTML_TAG: Regex = Regex::new(r"</?[^>]+(>|$)").unwrap();
    /// Whitespace wedged between two CJK ideographs
    static ref CJK_GAP: Regex = Regex::new(r"(\p{Han})\s+(\p{Han})").unwrap();
}

/// Remove all HTML tags from a fragment.
pub fn strip_html_tags(fragment: &str) -> String {
    HTML_TAG.replace_all(fragment, "").into_owned()
}

/// Decode HTML character entities (`&amp;`, `&lt;`, `&#8217;`, ...).
pub fn decode_entities(fragment: &str) -> String {
    html_escape::decode_html_entities(fragment).into_owned()
}

/// Decode `%XX` escapes. Zotero percent-encodes the annotation JSON it
/// stores in `data-annotation` attributes; the structured-field probes only
/// work on the decoded form. Invalid escape sequences are left untouched,
/// so ordinary `%` signs in extracted text survive.
pub fn decode_percent_escapes(fragment: &str) -> String {
    let decoded = urlencoding::decode_binary(fragment.as_bytes());
    String::from_utf8_lossy(&decoded).into_owned()
}

/// Replace backticks with single quotes so extracted text cannot open a
/// code span in the generated note.
pub fn normalize_backticks(fragment: &str) -> String {
    fragment.replace('`', "'")
}

/// Strip leading and trailing quotation marks (curly and straight) around
/// a highlight.
pub fn trim_quotes(fragment: &str) -> String {
    fragment
        .trim_start_matches(['“', '"', '`', '\''])
        .trim_end_matches(['”', '"', '`', '\''])
        .to_string()
}

/// Remove the spurious spaces PDF extraction inserts between CJK
/// ideographs. Matches cannot overlap in one pass, so run until stable.
pub fn collapse_cjk_spaces(fragment: &str) -> String {
    let mut current = Cow::Borrowed(fragment);
    loop {
        let next = CJK_GAP.replace_all(&current, "$1$2");
        if next == current {
            return next.into_owned();
        }
        current = Cow::Owned(next.into_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<p>hello <b>world</b></p>"), "hello world");
        // tag truncated by a paragraph split
        assert_eq!(strip_html_tags("text <span class=\"x"), "text ");
    }

    #[test]
    fn test_decode_entities() {
        assert_eq!(decode_entities("Smith &amp; Jones &lt;eds&gt;"), "Smith & Jones <eds>");
    }

    #[test]
    fn test_trim_quotes_mixed() {
        assert_eq!(trim_quotes("“Some highlighted sentence”"), "Some highlighted sentence");
        assert_eq!(trim_quotes("\"quoted\""), "quoted");
        assert_eq!(trim_quotes("plain"), "plain");
    }

    #[test]
    fn test_collapse_cjk_spaces() {
        assert_eq!(collapse_cjk_spaces("知 识 管 理"), "知识管理");
        assert_eq!(collapse_cjk_spaces("mixed 知 识 text"), "mixed 知识 text");
    }

    #[test]
    fn test_normalize_backticks() {
        assert_eq!(normalize_backticks("a `code` span"), "a 'code' span");
    }

    #[test]
    fn test_decode_percent_escapes() {
        assert_eq!(
            decode_percent_escapes("%7B%22color%22%3A%22%23ffd400%22%7D"),
            r##"{"color":"#ffd400"}"##
        );
        // plain percent signs survive
        assert_eq!(decode_percent_escapes("50% of cases"), "50% of cases");
    }
}
