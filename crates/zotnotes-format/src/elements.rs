//! The element formatter.
//!
//! Consumes the ordered annotation records of one note and produces the
//! final rendered line per record, in a single pass:
//!
//! 1. rewrite the citation fragment per the configured citation format and
//!    wrap it in the Zotero deep link
//! 2. wrap highlight/comment/tags with the configured decoration, keeping a
//!    no-prepend variant for lines that get merged elsewhere
//! 3. assemble the `{{highlight}} {{comment}} {{tag}}` composite
//! 4. resolve the directive: merge-above collapses two records into one,
//!    keywords leave the output stream entirely, headings and tasks bypass
//!    the decorated composite
//!
//! Records marked for deletion are removed after the pass, in descending
//! index order. Missing image files are warnings, never errors.

use crate::style::StyleSet;
use crate::template::encode_uri;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::{Path, PathBuf};
use zotnotes_core::{
    AnnotationKind, AnnotationRecord, CitationFormat, ExtractionSource, ImageCommentPosition,
    ImportConfig, ZoteroInfo,
};

lazy_static! {
    /// A markdown link span, `[` through the closing `)`
    static ref BRACKET_SPAN: Regex = Regex::new(r"\[.*\)").unwrap();
}

/// Everything one formatting pass produces.
#[derive(Debug, Clone, Default)]
pub struct FormatOutcome {
    /// Rendered lines, in record order
    pub lines: Vec<String>,
    /// Highlights of keyword-type records, removed from `lines`
    pub keywords: Vec<String>,
    /// Rendered lines of image records, also present in `lines`
    pub image_lines: Vec<String>,
    /// Image files the caller should copy into the vault (source, target)
    pub image_copies: Vec<(PathBuf, PathBuf)>,
    /// Non-fatal problems, e.g. unresolvable image sources
    pub warnings: Vec<String>,
}

/// Format the records of one note. `vault_base` is the vault root used to
/// build target paths for copied images.
pub fn format_note_elements(
    mut records: Vec<AnnotationRecord>,
    citation_key: &str,
    config: &ImportConfig,
    zotero_info: &ZoteroInfo,
    vault_base: &Path,
) -> FormatOutcome {
    let style = StyleSet::from_config(config);
    let mut outcome = FormatOutcome::default();
    let mut to_remove: Vec<usize> = Vec::new();

    for i in 0..records.len() {
        // the merge-above rule looks back exactly one (already formatted)
        // record; clone its row before borrowing the current one mutably
        let previous_row = if i > 0 {
            Some(records[i - 1].row_edited.clone())
        } else {
            None
        };
        let record = &mut records[i];

        rewrite_citation(record, citation_key, config);
        apply_backlink(record, config);

        // Zotero emits its own section heading rows
        if record.highlight_text == "Extracted Annotations" {
            record.kind = AnnotationKind::ExtractedHeading;
        }
        if record.kind == AnnotationKind::ExtractedHeading {
            record.row_edited = format!("**{}**", record.row_original.to_uppercase());
        }

        wrap_highlight(record, &style);
        wrap_comment(record, &style);
        wrap_tags(record, config, &style);
        apply_composite_template(record, config);

        // global prepend: every plain record with both texts present
        // behaves as if it carried the prepend directive
        if config.comment_prepend_default
            && record.kind == AnnotationKind::Plain
            && !record.highlight_text.is_empty()
            && !record.comment_text.is_empty()
        {
            record.kind = AnnotationKind::PrependComment;
        }

        match record.kind {
            AnnotationKind::Plain => {
                record.row_edited = record.formatted.composite.clone();
            }
            AnnotationKind::Image => {
                resolve_image(
                    record,
                    citation_key,
                    config,
                    zotero_info,
                    vault_base,
                    &mut outcome,
                );
            }
            AnnotationKind::MergeAbove => match previous_row {
                Some(previous) => {
                    let stripped = BRACKET_SPAN.replace(&previous, "");
                    record.row_edited = format!(
                        "{} {}{}{}",
                        stripped.trim_end(),
                        record.formatted.highlight_no_prepend.trim_start(),
                        record.formatted.comment,
                        record.formatted.tags
                    );
                    to_remove.push(i - 1);
                }
                // nothing above to merge into
                None => record.row_edited = record.formatted.composite.clone(),
            },
            AnnotationKind::PrependComment => {
                record.row_edited = format!(
                    "{}{}{}{}",
                    style.highlight_prepend,
                    record.formatted.comment_no_prepend,
                    record.formatted.highlight_no_prepend,
                    record.formatted.tags
                );
            }
            AnnotationKind::Heading(level) => {
                record.row_edited = format!(
                    "{} {}{}{}{}",
                    "#".repeat(level as usize),
                    record.highlight_text,
                    record.comment_text,
                    record.backlink,
                    record.formatted.tags
                );
            }
            AnnotationKind::Task => {
                record.row_edited = format!("- [ ] {}", record.formatted.composite_no_prepend);
            }
            AnnotationKind::Keyword => {
                outcome.keywords.push(record.highlight_text.clone());
                record.row_edited.clear();
                to_remove.push(i);
            }
            AnnotationKind::ExtractedHeading => {
                // already rendered above
            }
        }
    }

    // delete merged/keyword records, highest index first so earlier
    // indices stay valid
    to_remove.sort_unstable();
    to_remove.dedup();
    for index in to_remove.into_iter().rev() {
        records.remove(index);
    }

    for record in &records {
        outcome.lines.push(record.row_edited.clone());
        if record.kind == AnnotationKind::Image {
            outcome.image_lines.push(record.row_edited.clone());
        }
    }

    if config.double_spaced {
        let mut spaced = Vec::with_capacity(outcome.lines.len() * 2);
        for (i, line) in outcome.lines.drain(..).enumerate() {
            if i > 0 {
                spaced.push(String::new());
            }
            spaced.push(line);
        }
        outcome.lines = spaced;
    }

    outcome
}

/// Rewrite the citation fragment per the configured citation format.
fn rewrite_citation(record: &mut AnnotationRecord, citation_key: &str, config: &ImportConfig) {
    if !matches!(
        record.source,
        ExtractionSource::Zotero | ExtractionSource::Zotfile
    ) {
        return;
    }

    match config.citations_format {
        CitationFormat::AuthorYearPage => {}
        CitationFormat::PageNumberOnly => {
            if let Some(label) = record.page_label {
                record.cite_key = label.to_string();
            }
        }
        CitationFormat::Pandoc => {
            record.cite_key = match record.page_label {
                Some(label) => format!("[@{}, Page: {}]", citation_key, label),
                None => format!("[@{}]", citation_key),
            };
        }
        CitationFormat::Empty => {
            if record.page_label.is_some() {
                record.cite_key = " ".to_string();
            }
        }
    }
}

/// Turn the citation and backlink into markdown links, or blank the
/// backlink when link generation is off.
fn apply_backlink(record: &mut AnnotationRecord, config: &ImportConfig) {
    if config.citations_link && !record.backlink.is_empty() {
        let page = record
            .page_in_pdf
            .or(record.page_label)
            .map(|p| p.to_string())
            .unwrap_or_default();
        let target = record.backlink.clone();
        if config.citations_format != CitationFormat::Pandoc {
            record.cite_key = format!("[{}]({})", record.cite_key, target);
        } else {
            record.cite_key = format!("{} [{}]({})", record.cite_key, page, target);
        }
        record.backlink = format!(" [{}]({})", page, target);
    } else {
        record.backlink.clear();
    }
}

fn wrap_highlight(record: &mut AnnotationRecord, style: &StyleSet) {
    if record.highlight_text.is_empty() {
        record.formatted.highlight.clear();
        record.formatted.highlight_no_prepend.clear();
        return;
    }
    record.formatted.highlight = format!(
        "{}{}{}{} {} ",
        style.highlight_prepend,
        style.highlight_before,
        record.highlight_text,
        style.highlight_after,
        record.cite_key
    );
    record.formatted.highlight_no_prepend = format!(
        "{}{}{} {} ",
        style.highlight_before, record.highlight_text, style.highlight_after, record.cite_key
    );
}

fn wrap_comment(record: &mut AnnotationRecord, style: &StyleSet) {
    if record.comment_text.is_empty() {
        record.formatted.comment.clear();
        record.formatted.comment_no_prepend.clear();
        return;
    }
    if !record.highlight_text.is_empty() {
        record.formatted.comment = format!(
            "{}{}{}{} ",
            style.comment_prepend, style.comment_before, record.comment_text, style.comment_after
        );
        record.formatted.comment_no_prepend = format!(
            "{}{}{} ",
            style.comment_before, record.comment_text, style.comment_after
        );
    } else {
        // a stand-alone comment carries the backlink itself
        record.formatted.comment = format!(
            "{}{}{}{} {} ",
            style.comment_prepend,
            style.comment_before,
            record.comment_text,
            style.comment_after,
            record.backlink
        );
        record.formatted.comment_no_prepend = format!(
            "{}{}{} {} ",
            style.comment_before, record.comment_text, style.comment_after, record.backlink
        );
    }
}

fn wrap_tags(record: &mut AnnotationRecord, config: &ImportConfig, style: &StyleSet) {
    if config.tag_hash {
        // hash tags cannot contain spaces
        for tag in &mut record.inline_tags {
            *tag = tag.replace(' ', "");
        }
    }

    if record.inline_tags.iter().all(|t| t.is_empty()) {
        record.formatted.tags.clear();
        record.formatted.tags_no_prepend.clear();
        return;
    }

    let wrap = |tag: &str, prepend: &str| {
        // collapse the doubled hash when the tag already carries one
        format!("{}{}{}{}", prepend, style.tag_before, tag, style.tag_after).replacen("##", "#", 1)
    };

    record.formatted.tags = record
        .inline_tags
        .iter()
        .map(|t| wrap(t, &style.tag_prepend))
        .collect::<Vec<_>>()
        .join(" ");
    record.formatted.tags_no_prepend = record
        .inline_tags
        .iter()
        .map(|t| wrap(t, ""))
        .collect::<Vec<_>>()
        .join(" ");
}

fn apply_composite_template(record: &mut AnnotationRecord, config: &ImportConfig) {
    let template = config.highlight_export_template.as_str();
    record.formatted.composite = template
        .replacen("{{highlight}}", &record.formatted.highlight, 1)
        .replacen("{{comment}}", &record.formatted.comment, 1)
        .replacen("{{tag}}", &record.formatted.tags, 1)
        .trim_start()
        .to_string();
    record.formatted.composite_no_prepend = template
        .replacen("{{highlight}}", &record.formatted.highlight_no_prepend, 1)
        .replacen("{{comment}}", &record.formatted.comment_no_prepend, 1)
        .replacen("{{tag}}", &record.formatted.tags_no_prepend, 1)
        .trim_start()
        .to_string();
}

/// Render an image record: link into Zotero storage or embed a copy in the
/// vault, with the comment above or below. A missing source file degrades
/// to a warning and an empty image line.
fn resolve_image(
    record: &mut AnnotationRecord,
    citation_key: &str,
    config: &ImportConfig,
    zotero_info: &ZoteroInfo,
    vault_base: &Path,
    outcome: &mut FormatOutcome,
) {
    record.row_edited.clear();

    if config.images_import {
        // a manually configured storage path wins over the detected one
        let storage = if config.zotero_storage_path.is_empty() {
            zotero_info.storage_path.as_str()
        } else {
            config.zotero_storage_path.as_str()
        };
        let source = PathBuf::from(format!("{}{}", storage, record.image_path)).join("image.png");
        let file_name = format!("{}_{}.png", citation_key, record.image_path);
        let target = vault_base.join(&config.images_path).join(&file_name);

        if source.exists() {
            if config.images_copy {
                if !target.exists() {
                    outcome.image_copies.push((source, target));
                }
                record.row_edited = format!("![[{}]] {}", file_name, record.cite_key);
            } else {
                record.row_edited = format!(
                    "![image](file://{}){}",
                    encode_uri(&source.to_string_lossy()),
                    record.backlink
                );
            }
        } else {
            let message = format!(
                "Cannot find image at \"{}\". Check the Zotero data directory in the settings",
                source.display()
            );
            log::warn!("{}", message);
            outcome.warnings.push(message);
        }
    }

    if !record.comment_text.is_empty() {
        let comment = format!("{}{}", record.formatted.comment, record.formatted.tags);
        record.row_edited = match config.images_comment_position {
            ImageCommentPosition::BelowImage => {
                format!("{}\n\n{}", record.row_edited, comment)
            }
            ImageCommentPosition::AboveImage => {
                format!("{}\n\n{}", comment, record.row_edited)
            }
        };
    }
}
