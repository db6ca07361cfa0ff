//! Core data models for the annotation pipeline.
//!
//! These types are designed the same way across the workspace:
//! - **Serializable**: all types derive Serialize/Deserialize
//! - **Type-safe**: closed enums replace the magic strings of the data the
//!   pipeline ingests
//! - **Mutation through one pass**: an [`AnnotationRecord`] is created by a
//!   source parser and rewritten at most once, by the element formatter

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Which exporter produced a raw note blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Zotero's native PDF reader export (`<span class="highlight">` markup)
    Zotero,
    /// Zotfile's extracted-annotations export (`zotero://open-pdf` anchors)
    Zotfile,
    /// A note written by hand in Zotero (`div data-schema-version` wrapper)
    UserNote,
    /// Anything else; handled like a user note
    Other,
}

/// Semantic role of one annotation record, decided by the directive embedded
/// in its comment (or by the markup, for images).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    /// Ordinary highlight/comment line, no directive
    Plain,
    /// Embedded image (`data-attachment-key` present in the markup)
    Image,
    /// Merge this record into the previous output line
    MergeAbove,
    /// Render the comment before the highlight
    PrependComment,
    /// Render as a Markdown heading of the given level (1-6)
    Heading(u8),
    /// Render as an open checklist item
    Task,
    /// Remove from the output and collect the highlight as a keyword
    Keyword,
    /// Section heading emitted by the exporter itself
    ExtractedHeading,
}

impl AnnotationKind {
    /// Build a heading kind, clamping the level to 1-6.
    pub fn heading(level: u8) -> Self {
        AnnotationKind::Heading(level.clamp(1, 6))
    }

    /// Whether a directive was recognized (anything but a plain line).
    pub fn is_directive(&self) -> bool {
        !matches!(self, AnnotationKind::Plain)
    }
}

impl Default for AnnotationKind {
    fn default() -> Self {
        AnnotationKind::Plain
    }
}

/// Strings derived by the element formatter for one record.
///
/// The `*_no_prepend` variants drop the leading bullet/blockquote markup and
/// are used when the record is merged into another line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormattedText {
    pub highlight: String,
    pub highlight_no_prepend: String,
    pub comment: String,
    pub comment_no_prepend: String,
    pub tags: String,
    pub tags_no_prepend: String,
    pub composite: String,
    pub composite_no_prepend: String,
}

/// One logical highlight/comment/image line extracted from a raw note blob.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub source: ExtractionSource,
    pub kind: AnnotationKind,

    /// Highlighted passage, quotes stripped
    pub highlight_text: String,
    /// Comment attached to the highlight, directive and tag block removed
    pub comment_text: String,
    /// Highlight colour as `#rrggbb`, empty when absent
    pub highlight_colour: String,

    /// Raw parenthesized citation fragment, e.g. `(Smith, 2020, p. 12)`;
    /// rewritten in place by the formatter
    pub cite_key: String,
    /// 1-based page inside the PDF
    pub page_in_pdf: Option<u32>,
    /// Author-facing page number printed on the page
    pub page_label: Option<u32>,
    /// Attachment item key extracted from the annotation URI
    pub attachment_uri: String,
    /// Key of the annotation itself
    pub annotation_key: String,
    /// `zotero://open-pdf/...` deep link (display form after formatting)
    pub backlink: String,
    /// Attachment key of an embedded image
    pub image_path: String,

    /// Raw tag block sliced out of the comment
    pub inline_tags_text: String,
    /// Individual tag tokens, split on the configured divider
    pub inline_tags: Vec<String>,

    /// Source text of the line; never rewritten after construction
    pub row_original: String,
    /// Output text of the line, rewritten by the formatter
    pub row_edited: String,

    #[serde(default)]
    pub formatted: FormattedText,
}

impl AnnotationRecord {
    /// Create an empty record for a cleaned source line.
    pub fn new(source: ExtractionSource, row: impl Into<String>) -> Self {
        let row = row.into();
        Self {
            source,
            kind: AnnotationKind::Plain,
            highlight_text: String::new(),
            comment_text: String::new(),
            highlight_colour: String::new(),
            cite_key: String::new(),
            page_in_pdf: None,
            page_label: None,
            attachment_uri: String::new(),
            annotation_key: String::new(),
            backlink: String::new(),
            image_path: String::new(),
            inline_tags_text: String::new(),
            inline_tags: Vec::new(),
            row_edited: row.clone(),
            row_original: row,
            formatted: FormattedText::default(),
        }
    }

    /// Synthesize the `zotero://open-pdf` deep link. Requires the attachment
    /// URI, the PDF page and the annotation key; returns `None` otherwise.
    pub fn build_backlink(&self) -> Option<String> {
        let page = self.page_in_pdf?;
        if self.attachment_uri.is_empty() || self.annotation_key.is_empty() {
            return None;
        }
        Some(format!(
            "zotero://open-pdf/library/items/{}?page={}&annotation={}",
            self.attachment_uri, page, self.annotation_key
        ))
    }
}

/// Role of a creator in the bibliographic record. Zotero knows many more
/// roles (series editor, contributor, ...); everything beyond the three the
/// pipeline distinguishes maps to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatorRole {
    Author,
    Editor,
    Translator,
    Other,
}

impl<'de> serde::Deserialize<'de> for CreatorRole {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "author" => CreatorRole::Author,
            "editor" => CreatorRole::Editor,
            "translator" => CreatorRole::Translator,
            _ => CreatorRole::Other,
        })
    }
}

/// One author/editor/translator. Zotero exports either a single `name` or a
/// `firstName`/`lastName` pair; any part may be absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default = "CreatorRole::default_role")]
    pub creator_type: CreatorRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

impl CreatorRole {
    fn default_role() -> Self {
        CreatorRole::Author
    }
}

impl Creator {
    /// Author with first and last name parts.
    pub fn person(role: CreatorRole, first: &str, last: &str) -> Self {
        Self {
            creator_type: role,
            name: None,
            first_name: Some(first.to_string()),
            last_name: Some(last.to_string()),
        }
    }

    /// Creator with a single display name (institutions, collectives).
    pub fn named(role: CreatorRole, name: &str) -> Self {
        Self {
            creator_type: role,
            name: Some(name.to_string()),
            first_name: None,
            last_name: None,
        }
    }
}

lazy_static! {
    /// Everything up to and including the first `Zotero/storage/` component
    static ref STORAGE_UNIX: Regex = Regex::new(r"(?s)^.*?Zotero/storage/").unwrap();
    /// Windows flavour of the same probe
    static ref STORAGE_WINDOWS: Regex = Regex::new(r"(?s)^.*?Zotero\\storage\\").unwrap();
}

/// Location of the Zotero storage directory, derived from the first
/// attachment of an entry (or from the manual override in the settings).
/// Consumed by the image-resolution step of the element formatter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoteroInfo {
    /// Absolute path of `Zotero/storage/`, trailing separator included;
    /// empty when it could not be determined
    pub storage_path: String,
    /// `Some(true)` when the path uses Windows separators
    pub windows_build: Option<bool>,
}

impl ZoteroInfo {
    /// Detect the storage directory from an attachment path, falling back to
    /// the manually configured location.
    pub fn detect(attachment_path: Option<&str>, manual_storage_path: &str) -> Self {
        let mut storage_path = String::new();
        let mut windows_build = None;

        if let Some(path) = attachment_path {
            if let Some(m) = STORAGE_UNIX.find(path) {
                storage_path = m.as_str().to_string();
                windows_build = Some(false);
            }
            if let Some(m) = STORAGE_WINDOWS.find(path) {
                storage_path = m.as_str().to_string();
                windows_build = Some(true);
            }
        }

        if storage_path.is_empty() && !manual_storage_path.is_empty() {
            storage_path = manual_storage_path.to_string();
            let lower = storage_path.to_lowercase();
            if lower.ends_with("\\zotero") {
                storage_path.push_str("\\storage\\");
            } else if lower.ends_with("\\zotero\\") {
                storage_path.push_str("storage\\");
            } else if lower.ends_with("/zotero") {
                storage_path.push_str("/storage/");
            } else if lower.ends_with("/zotero/") {
                storage_path.push_str("storage/");
            }
        }

        Self {
            storage_path,
            windows_build,
        }
    }
}
