//! Note reconciliation.
//!
//! When a note already exists on disk and overwriting is disabled, freshly
//! generated lines are spliced into the old note instead of replacing it.
//! Presence is decided by a substring heuristic, not a diff: each new line
//! (markup and citation suffix stripped) probes the old note whole, in
//! halves, or in quarters depending on its length, and the insertion point
//! is the next line break after the highest position confirmed so far (a
//! watermark that only advances). The heuristic is deliberately preserved
//! as-is; manual-edit preservation depends on its exact behavior.

use lazy_static::lazy_static;
use regex::Regex;
use zotnotes_core::{ImportConfig, SaveMode};

lazy_static! {
    static ref TRAILING_ASTERISKS: Regex = Regex::new(r"\*+$").unwrap();
}

/// Split a cleaned line into the substrings probed against the old note.
///
/// Lines of 2-29 characters probe whole; 30-149 probe first and second
/// half; 150 and longer probe each quarter. Shorter lines have no probe
/// tier and are treated as not-found.
pub fn probe_segments(line: &str) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    let n = chars.len();
    let slice = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    if n > 1 && n < 30 {
        vec![line.to_string()]
    } else if (30..150).contains(&n) {
        vec![slice(0, n / 2), slice(n / 2 + 1, n)]
    } else if n >= 150 {
        vec![
            slice(0, n / 4),
            slice(n / 4 + 1, n / 2),
            slice(n / 2 + 1, 3 * n / 4),
            slice(3 * n / 4 + 1, n),
        ]
    } else {
        Vec::new()
    }
}

fn strip_once<'a>(line: &'a str, prefix: &str) -> &'a str {
    line.strip_prefix(prefix).unwrap_or(line)
}

fn strip_once_end<'a>(line: &'a str, suffix: &str) -> &'a str {
    line.strip_suffix(suffix).unwrap_or(line)
}

/// Remove the formatting this tool adds around a line (bullet, blockquote,
/// emphasis, quotes) and the trailing author citation in either of its two
/// known shapes, leaving the text that should be probed.
fn strip_line_markup(
    line: &str,
    zotero_suffix: Option<&Regex>,
    zotfile_suffix: Option<&Regex>,
) -> String {
    let line = line.trim();
    let line = strip_once(line, "- ");
    let line = strip_once(line, "> ");
    let line = strip_once(line, "=");
    let line = line.trim_start_matches('*');
    let line = strip_once(line, "\"");

    let mut line = line.to_string();
    if let Some(re) = zotero_suffix {
        line = re.replace(&line, "").into_owned();
    }
    if let Some(re) = zotfile_suffix {
        line = re.replace(&line, "").into_owned();
    }

    let line = strip_once_end(&line, "=");
    let line = TRAILING_ASTERISKS.replace(line, "");
    strip_once_end(&line, "\"").to_string()
}

/// Splice the lines of `new_note` that are not already present into
/// `existing`. `author_key` anchors the citation-suffix patterns.
pub fn merge_notes(
    existing: &str,
    new_note: &str,
    author_key: &str,
    config: &ImportConfig,
) -> String {
    let newline_positions: Vec<usize> = existing.match_indices('\n').map(|(i, _)| i).collect();

    let escaped = regex::escape(author_key);
    let zotero_suffix = Regex::new(&format!(r"\({}, \d+, p\. \d+\)$", escaped)).ok();
    let zotfile_suffix = Regex::new(&format!(r"\({} \d+:\d+\)$", escaped)).ok();

    // highest old-note offset confirmed so far; only ever advances
    let mut watermark: usize = 0;
    let mut inserts: Vec<(usize, &str)> = Vec::new();

    for line in new_note.split('\n') {
        let cleaned = strip_line_markup(line, zotero_suffix.as_ref(), zotfile_suffix.as_ref());
        if cleaned.is_empty() {
            continue;
        }

        let found = probe_segments(&cleaned)
            .iter()
            .filter_map(|segment| existing.find(segment.as_str()))
            .max();

        match found {
            Some(position) => watermark = watermark.max(position),
            None => {
                let insert_at = newline_positions
                    .iter()
                    .copied()
                    .find(|&p| p > watermark)
                    .unwrap_or(existing.len());
                inserts.push((insert_at, line));
            }
        }
    }

    let spacer = if config.double_spaced { "\n" } else { "" };
    let mut merged = existing.to_string();
    // reverse order keeps earlier insertion offsets valid
    for (position, text) in inserts.into_iter().rev() {
        merged.insert_str(position, &format!("{}\n{}", spacer, text));
    }
    merged
}

/// `(start, end)` byte window delimited by the configured markers; missing
/// markers clamp to the whole string.
fn section_bounds(text: &str, start_marker: &str, end_marker: &str) -> (usize, usize) {
    let start = if start_marker.is_empty() {
        0
    } else {
        text.find(start_marker).unwrap_or(0)
    };
    let end = if end_marker.is_empty() {
        text.len()
    } else {
        text.find(end_marker)
            .map(|i| i + end_marker.len())
            .unwrap_or(text.len())
    };
    (start, end.max(start))
}

/// Merge old and new note text, then apply the configured save policy.
///
/// With [`SaveMode::SelectSection`], the delimited window of the merged old
/// note replaces the matching window of the new note; everything outside
/// the window comes from the new note.
pub fn reconcile(
    existing: &str,
    new_note: &str,
    author_key: &str,
    config: &ImportConfig,
) -> String {
    let merged = merge_notes(existing, new_note, author_key, config);

    match config.save_manual_edits {
        SaveMode::OverwriteEntireNote | SaveMode::SaveEntireNote => merged,
        SaveMode::SelectSection => {
            let (old_start, old_end) = section_bounds(
                &merged,
                &config.save_start_marker,
                &config.save_end_marker,
            );
            let preserved = &merged[old_start..old_end];

            let (new_start, new_end) = section_bounds(
                new_note,
                &config.save_start_marker,
                &config.save_end_marker,
            );
            format!(
                "{}{}{}",
                &new_note[..new_start],
                preserved,
                &new_note[new_end..]
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImportConfig {
        ImportConfig::default()
    }

    #[test]
    fn test_probe_tier_boundaries() {
        assert_eq!(probe_segments("a").len(), 0);
        assert_eq!(probe_segments("ab").len(), 1);
        assert_eq!(probe_segments(&"x".repeat(29)).len(), 1);
        assert_eq!(probe_segments(&"x".repeat(30)).len(), 2);
        assert_eq!(probe_segments(&"x".repeat(149)).len(), 2);
        // exactly 150 characters uses the quarter probes
        assert_eq!(probe_segments(&"x".repeat(150)).len(), 4);
    }

    #[test]
    fn test_probe_segments_are_character_based() {
        // multi-byte text must not split inside a code point
        let line = "знание сила и ещё немного текста про это".repeat(2);
        for segment in probe_segments(&line) {
            assert!(!segment.is_empty());
        }
    }

    #[test]
    fn test_strip_line_markup() {
        let re = Regex::new(r"\(Smith, \d+, p\. \d+\)$").unwrap();
        let cleaned = strip_line_markup(
            "- *“highlighted text here”* (Smith, 2020, p. 4)",
            Some(&re),
            None,
        );
        assert!(cleaned.starts_with("“highlighted text here"));
        assert!(!cleaned.contains("Smith"));
    }

    #[test]
    fn test_reconcile_identity() {
        let note = concat!(
            "# Smith 2020\n",
            "\n",
            "- *“a first highlight that is long enough”* (Smith, 2020, p. 1)\n",
            "\n",
            "- *“a second highlight, also long enough”* (Smith, 2020, p. 2)\n"
        );
        let merged = reconcile(note, note, "Smith", &config());
        assert_eq!(merged, note);
    }

    #[test]
    fn test_new_line_inserted_after_watermark() {
        let existing = concat!(
            "# Smith 2020\n",
            "- “an old highlight kept here” (Smith, 2020, p. 1)\n",
            "- “a final old highlight line” (Smith, 2020, p. 9)\n"
        );
        let new_note = concat!(
            "# Smith 2020\n",
            "- “an old highlight kept here” (Smith, 2020, p. 1)\n",
            "- “a brand new highlight line” (Smith, 2020, p. 2)\n"
        );
        let mut cfg = config();
        cfg.double_spaced = false;
        let merged = reconcile(existing, new_note, "Smith", &cfg);

        assert!(merged.contains("a brand new highlight line"));
        // old content is kept
        assert!(merged.contains("a final old highlight line"));
        // the new line lands after the line that anchored the watermark
        let kept = merged.find("an old highlight kept here").unwrap();
        let added = merged.find("a brand new highlight line").unwrap();
        assert!(added > kept);
    }

    #[test]
    fn test_insert_at_end_when_no_line_break_remains() {
        let existing = "- “the only line of the old note, unterminated” (Smith, 2020, p. 1)";
        let new_note = concat!(
            "- “the only line of the old note, unterminated” (Smith, 2020, p. 1)\n",
            "- “appended afterwards with more text” (Smith, 2020, p. 2)"
        );
        let mut cfg = config();
        cfg.double_spaced = false;
        let merged = reconcile(existing, new_note, "Smith", &cfg);
        assert!(merged.ends_with("- “appended afterwards with more text” (Smith, 2020, p. 2)"));
        // the note is not duplicated
        assert_eq!(merged.matches("the only line").count(), 1);
    }

    #[test]
    fn test_select_section_policy() {
        let mut cfg = config();
        cfg.save_manual_edits = SaveMode::SelectSection;
        cfg.save_start_marker = "## Notes".to_string();
        cfg.save_end_marker = "## End".to_string();

        let existing = "# Old Header\n## Notes\nmy manual edits of substantial length\n## End\nold tail\n";
        let new_note = "# New Header\n## Notes\nfreshly generated body\n## End\nnew tail\n";
        let merged = reconcile(existing, new_note, "Smith", &cfg);

        // outside the preserved window the new note wins
        assert!(merged.starts_with("# New Header"));
        assert!(merged.ends_with("new tail\n"));
        assert!(!merged.contains("# Old Header"));
        assert!(!merged.contains("old tail"));
        // inside it, the merged old note wins (manual edits survive)
        assert!(merged.contains("my manual edits of substantial length"));
    }

    #[test]
    fn test_select_section_missing_markers_default_to_whole_note() {
        let mut cfg = config();
        cfg.save_manual_edits = SaveMode::SelectSection;
        cfg.save_start_marker = "## Absent".to_string();
        cfg.save_end_marker = String::new();

        let existing = "entirely the old note body with enough text\n";
        let new_note = "entirely the new note body with enough text\n";
        let merged = reconcile(existing, new_note, "Smith", &cfg);
        // the preserved window degrades to the whole merged note
        assert!(merged.contains("entirely the old note body"));
    }

    #[test]
    fn test_author_key_with_regex_metacharacters() {
        let existing = "- “text by a dotted author name” (S.m.i.t.h, 2020, p. 1)\n";
        // must not panic or misparse when the key contains regex syntax
        let merged = reconcile(existing, existing, "S.m.i.t.h", &config());
        assert_eq!(merged, existing);
    }

    #[test]
    fn test_double_spacing_adds_blank_line_before_insert() {
        let existing = "- “the old line with enough characters” (Smith, 2020, p. 1)\nend\n";
        let new_note = concat!(
            "- “the old line with enough characters” (Smith, 2020, p. 1)\n",
            "- “completely different subject matter here” (Smith, 2020, p. 2)\n"
        );
        let merged = reconcile(existing, new_note, "Smith", &config());
        assert!(merged.contains("\n\n- “completely different subject matter here”"));
    }
}
