//! Decoration strings derived from the style toggles.
//!
//! Highlights, comments and tags each get a before/after wrapping (emphasis,
//! highlight marks, quotes, custom text) and a prepend (bullet/blockquote
//! prefix on its own line). The prepend is only emitted when a bullet or
//! blockquote is configured; merged lines use the no-prepend variants.

use zotnotes_core::ImportConfig;

/// Pre-assembled decoration fragments for one formatting run.
#[derive(Debug, Clone, Default)]
pub struct StyleSet {
    pub highlight_before: String,
    pub highlight_after: String,
    pub highlight_prepend: String,
    pub comment_before: String,
    pub comment_after: String,
    pub comment_prepend: String,
    pub tag_before: String,
    pub tag_after: String,
    pub tag_prepend: String,
}

fn flag(enabled: bool, mark: &str) -> &str {
    if enabled {
        mark
    } else {
        ""
    }
}

impl StyleSet {
    /// Assemble the decoration fragments from the configuration.
    pub fn from_config(config: &ImportConfig) -> Self {
        let h_italic = flag(config.highlight_italic, "*");
        let h_bold = flag(config.highlight_bold, "**");
        let h_mark = flag(config.highlight_highlighted, "==");
        let h_bullet = flag(config.highlight_bullet, "- ");
        let h_quote_open = flag(config.highlight_quote, "“");
        let h_quote_close = flag(config.highlight_quote, "”");
        let h_blockquote = flag(config.highlight_blockquote, "> ");

        let highlight_before = format!("{h_mark}{h_bold}{h_italic}{h_quote_open}");
        let highlight_after = format!(
            "{h_quote_close}{h_italic}{h_bold}{h_mark}{}",
            config.highlight_custom_after
        );
        let highlight_prepend = if h_bullet.is_empty() && h_blockquote.is_empty() {
            String::new()
        } else {
            format!(
                "\n{h_bullet}{h_blockquote}{}",
                config.highlight_custom_before
            )
        };

        let c_italic = flag(config.comment_italic, "*");
        let c_bold = flag(config.comment_bold, "**");
        let c_mark = flag(config.comment_highlighted, "==");
        let c_bullet = flag(config.comment_bullet, "- ");
        let c_quote_open = flag(config.comment_quote, "“");
        let c_quote_close = flag(config.comment_quote, "”");
        let c_blockquote = flag(config.comment_blockquote, "> ");

        let comment_before = format!("{c_mark}{c_bold}{c_italic}{c_quote_open}");
        let comment_after = format!(
            "{c_quote_close}{c_italic}{c_bold}{c_mark}{}",
            config.comment_custom_after
        );
        let comment_prepend = if c_bullet.is_empty() && c_blockquote.is_empty() {
            String::new()
        } else {
            format!("\n{c_bullet}{c_blockquote}{}", config.comment_custom_before)
        };

        let t_hash = flag(config.tag_hash, "#");
        let t_italic = flag(config.tag_italic, "*");
        let t_bold = flag(config.tag_bold, "**");
        let t_mark = flag(config.tag_highlighted, "==");
        let t_bullet = flag(config.tag_bullet, "- ");
        let t_quote_open = flag(config.tag_quote, "“");
        let t_quote_close = flag(config.tag_quote, "”");
        let t_blockquote = flag(config.tag_blockquote, "> ");

        let tag_before = format!("{t_hash}{t_mark}{t_bold}{t_italic}{t_quote_open}");
        let tag_after = format!(
            "{t_quote_close}{t_italic}{t_bold}{t_mark}{}",
            config.tag_custom_after
        );
        // Tags without a bullet/blockquote stay inline, so the custom
        // prefix is kept even when no newline is emitted.
        let tag_prepend = if t_bullet.is_empty() && t_blockquote.is_empty() {
            format!("{t_bullet}{t_blockquote}{}", config.tag_custom_before)
        } else {
            format!("\n{t_bullet}{t_blockquote}{}", config.tag_custom_before)
        };

        Self {
            highlight_before,
            highlight_after,
            highlight_prepend,
            comment_before,
            comment_after,
            comment_prepend,
            tag_before,
            tag_after,
            tag_prepend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_style() {
        let style = StyleSet::from_config(&ImportConfig::default());
        // italic quoted highlight as a bullet
        assert_eq!(style.highlight_before, "*“");
        assert_eq!(style.highlight_after, "”*");
        assert_eq!(style.highlight_prepend, "\n- ");
        // bold blockquoted comment
        assert_eq!(style.comment_before, "**");
        assert_eq!(style.comment_prepend, "\n> ");
        // hashed tag with a custom '#' prefix
        assert_eq!(style.tag_before, "#");
        assert_eq!(style.tag_prepend, "#");
    }

    #[test]
    fn test_custom_before_needs_prefix_marker() {
        let mut config = ImportConfig::default();
        config.highlight_bullet = false;
        config.highlight_custom_before = ">> ".to_string();
        let style = StyleSet::from_config(&config);
        // without bullet or blockquote no prepend line is emitted
        assert_eq!(style.highlight_prepend, "");
    }

    #[test]
    fn test_bold_highlight_ordering() {
        let mut config = ImportConfig::default();
        config.highlight_bold = true;
        config.highlight_quote = false;
        let style = StyleSet::from_config(&config);
        assert_eq!(style.highlight_before, "***");
        assert_eq!(style.highlight_after, "***");
    }
}
