//! Directive classifier.
//!
//! Comments attached to a highlight can start with (or consist of) a
//! configured trigger token that changes how the annotation is rendered:
//! merge into the previous line, prepend the comment, turn into a heading,
//! a task, or a keyword.
//!
//! Precedence: first-word rules run first (merge-above by full text or
//! first word, comment-prepend, then H1-H6 by first word); full-text rules
//! run second and override (H1-H6 by full text, then keyword and task by
//! full text or first word). All comparisons are case-insensitive exact
//! matches, and empty trigger tokens never match.

use zotnotes_core::{AnnotationKind, ImportConfig};

fn matches_token(candidate: &str, token: &str) -> bool {
    !token.is_empty() && candidate.eq_ignore_ascii_case(token)
}

/// Classify a comment into an [`AnnotationKind`] from its first word and its
/// full text.
pub fn classify(first_word: &str, full_text: &str, config: &ImportConfig) -> AnnotationKind {
    let headings = [
        (config.key_h1.as_str(), 1u8),
        (config.key_h2.as_str(), 2),
        (config.key_h3.as_str(), 3),
        (config.key_h4.as_str(), 4),
        (config.key_h5.as_str(), 5),
        (config.key_h6.as_str(), 6),
    ];

    let mut kind = AnnotationKind::Plain;

    // First-word pass
    if matches_token(full_text, &config.key_merge_above)
        || matches_token(first_word, &config.key_merge_above)
    {
        kind = AnnotationKind::MergeAbove;
    } else if matches_token(first_word, &config.key_comment_prepend) {
        kind = AnnotationKind::PrependComment;
    } else {
        for (token, level) in &headings {
            if matches_token(first_word, token) {
                kind = AnnotationKind::Heading(*level);
                break;
            }
        }
    }

    // Full-text pass, overriding the first-word result
    for (token, level) in &headings {
        if matches_token(full_text, token) {
            return AnnotationKind::Heading(*level);
        }
    }
    if matches_token(full_text, &config.key_keyword)
        || matches_token(first_word, &config.key_keyword)
    {
        return AnnotationKind::Keyword;
    }
    if matches_token(full_text, &config.key_task) || matches_token(first_word, &config.key_task) {
        return AnnotationKind::Task;
    }

    kind
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ImportConfig {
        ImportConfig::default()
    }

    #[test]
    fn test_plain_comment() {
        assert_eq!(
            classify("interesting", "interesting point", &config()),
            AnnotationKind::Plain
        );
    }

    #[test]
    fn test_h1_by_full_text() {
        // comment "# Main Point": first word "#" matches the H1 trigger
        assert_eq!(
            classify("#", "# Main Point", &config()),
            AnnotationKind::Heading(1)
        );
        // a bare "#" comment matches by full text
        assert_eq!(classify("", "#", &config()), AnnotationKind::Heading(1));
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(
            classify("###", "### Methods", &config()),
            AnnotationKind::Heading(3)
        );
        assert_eq!(
            classify("######", "###### Fine print", &config()),
            AnnotationKind::Heading(6)
        );
    }

    #[test]
    fn test_merge_above() {
        assert_eq!(classify("+", "+", &config()), AnnotationKind::MergeAbove);
        assert_eq!(
            classify("+", "+ continues the thought", &config()),
            AnnotationKind::MergeAbove
        );
    }

    #[test]
    fn test_comment_prepend() {
        assert_eq!(
            classify("%", "% context first", &config()),
            AnnotationKind::PrependComment
        );
    }

    #[test]
    fn test_keyword_and_task() {
        assert_eq!(classify("", "=", &config()), AnnotationKind::Keyword);
        assert_eq!(
            classify("=", "= machine learning", &config()),
            AnnotationKind::Keyword
        );
        assert_eq!(classify("", "todo", &config()), AnnotationKind::Task);
        assert_eq!(
            classify("todo", "todo check the proof", &config()),
            AnnotationKind::Task
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(
            classify("TODO", "TODO follow up", &config()),
            AnnotationKind::Task
        );
    }

    #[test]
    fn test_full_text_overrides_first_word() {
        // a comment that is exactly the task token wins over a first-word
        // heading interpretation
        let mut cfg = config();
        cfg.key_task = "#".to_string();
        cfg.key_h1 = "h1".to_string();
        assert_eq!(classify("#", "#", &cfg), AnnotationKind::Task);
    }

    #[test]
    fn test_empty_tokens_never_match() {
        let mut cfg = config();
        cfg.key_task = String::new();
        assert_eq!(classify("", "", &cfg), AnnotationKind::Plain);
    }
}
