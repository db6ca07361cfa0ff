//! Configuration for the import pipeline.
//!
//! One flat [`ImportConfig`] record owns every style and behavior toggle.
//! The orchestrator loads it once per run and passes it by reference to
//! every pipeline stage; nothing in the core mutates it.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the citation fragment after a highlight is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationFormat {
    /// `(Author, year, p. N)` exactly as exported
    AuthorYearPage,
    /// Just the page label
    PageNumberOnly,
    /// `[@citekey, Page: N]`
    Pandoc,
    /// Blank the citation fragment
    Empty,
}

/// What happens when a note already exists on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveMode {
    /// Regenerate from scratch, discarding manual edits
    OverwriteEntireNote,
    /// Splice new annotation lines into the existing note
    SaveEntireNote,
    /// Reconcile, then keep only the delimited section of the old note
    SelectSection,
}

/// Where an image comment is placed relative to the image line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageCommentPosition {
    AboveImage,
    BelowImage,
}

/// What to do with `{{field}}` placeholders that have no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingFieldPolicy {
    LeavePlaceholder,
    ReplaceWithCustomText,
    RemoveRow,
}

/// Which notes the batch update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateScope {
    /// Only refresh notes that already exist in the vault
    OnlyExistingNotes,
    /// Create notes for entries that have none yet
    CreateWhenMissing,
}

/// Flat record of every import/style toggle.
///
/// Defaults reproduce the stock behavior: italic quoted highlights as
/// bullets, bold blockquoted comments, hash tags, double-spaced output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Path to the Better-BibTeX JSON export
    pub bib_path: PathBuf,
    /// Template note inside the vault; `None` uses the built-in template
    pub template_path: Option<PathBuf>,
    /// Folder (inside the vault) where notes are written
    pub import_path: PathBuf,
    /// File name pattern for generated notes, e.g. `@{{citeKey}}`
    pub import_file_name: String,

    pub missing_field: MissingFieldPolicy,
    pub missing_field_replacement: String,

    pub save_manual_edits: SaveMode,
    /// Marker opening the preserved section (empty = start of note)
    pub save_start_marker: String,
    /// Marker closing the preserved section (empty = end of note)
    pub save_end_marker: String,

    pub images_import: bool,
    /// Copy images into the vault instead of linking into Zotero storage
    pub images_copy: bool,
    /// Vault-relative folder receiving copied images
    pub images_path: String,
    pub images_comment_position: ImageCommentPosition,
    /// Manual override for the Zotero storage directory
    pub zotero_storage_path: String,

    // Directive trigger tokens (matched case-insensitively against the
    // first word or the whole comment)
    pub key_merge_above: String,
    pub key_comment_prepend: String,
    /// Prepend the comment whenever both highlight and comment are present
    pub comment_prepend_default: bool,
    pub key_h1: String,
    pub key_h2: String,
    pub key_h3: String,
    pub key_h4: String,
    pub key_h5: String,
    pub key_h6: String,
    pub key_keyword: String,
    pub key_task: String,

    // Inline tag block inside comments
    pub tag_begin: String,
    /// Empty = the tag block runs to the end of the comment
    pub tag_end: String,
    pub tag_divider: String,

    // Highlight typography
    pub highlight_italic: bool,
    pub highlight_bold: bool,
    pub highlight_highlighted: bool,
    pub highlight_bullet: bool,
    pub highlight_blockquote: bool,
    pub highlight_quote: bool,
    pub highlight_custom_before: String,
    pub highlight_custom_after: String,

    // Comment typography
    pub comment_italic: bool,
    pub comment_bold: bool,
    pub comment_highlighted: bool,
    pub comment_bullet: bool,
    pub comment_blockquote: bool,
    pub comment_quote: bool,
    pub comment_custom_before: String,
    pub comment_custom_after: String,

    // Tag typography
    pub tag_italic: bool,
    pub tag_bold: bool,
    pub tag_highlighted: bool,
    pub tag_bullet: bool,
    pub tag_blockquote: bool,
    pub tag_quote: bool,
    pub tag_hash: bool,
    pub tag_custom_before: String,
    pub tag_custom_after: String,

    pub double_spaced: bool,
    /// Arrangement of `{{highlight}} {{comment}} {{tag}}` per output line
    pub highlight_export_template: String,
    /// Divider between multiple values of one template field
    pub fields_divider: String,
    /// Per-creator rendering for `{{author}}`-style placeholders
    pub name_format: String,
    pub citations_format: CitationFormat,
    /// Wrap citations in a markdown link to the Zotero deep link
    pub citations_link: bool,

    pub update_scope: UpdateScope,
    /// Entries modified before this instant are skipped by the batch update
    pub last_update: DateTime<Utc>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            bib_path: PathBuf::new(),
            template_path: None,
            import_path: PathBuf::new(),
            import_file_name: "@{{citeKey}}".to_string(),
            missing_field: MissingFieldPolicy::LeavePlaceholder,
            missing_field_replacement: "NA".to_string(),
            save_manual_edits: SaveMode::OverwriteEntireNote,
            save_start_marker: String::new(),
            save_end_marker: String::new(),
            images_import: true,
            images_copy: false,
            images_path: String::new(),
            images_comment_position: ImageCommentPosition::AboveImage,
            zotero_storage_path: String::new(),
            key_merge_above: "+".to_string(),
            key_comment_prepend: "%".to_string(),
            comment_prepend_default: false,
            key_h1: "#".to_string(),
            key_h2: "##".to_string(),
            key_h3: "###".to_string(),
            key_h4: "####".to_string(),
            key_h5: "#####".to_string(),
            key_h6: "######".to_string(),
            key_keyword: "=".to_string(),
            key_task: "todo".to_string(),
            tag_begin: "Tag: ".to_string(),
            tag_end: String::new(),
            tag_divider: "; ".to_string(),
            highlight_italic: true,
            highlight_bold: false,
            highlight_highlighted: false,
            highlight_bullet: true,
            highlight_blockquote: false,
            highlight_quote: true,
            highlight_custom_before: String::new(),
            highlight_custom_after: String::new(),
            comment_italic: false,
            comment_bold: true,
            comment_highlighted: false,
            comment_bullet: false,
            comment_blockquote: true,
            comment_quote: false,
            comment_custom_before: String::new(),
            comment_custom_after: String::new(),
            tag_italic: false,
            tag_bold: false,
            tag_highlighted: false,
            tag_bullet: false,
            tag_blockquote: false,
            tag_quote: false,
            tag_hash: true,
            tag_custom_before: "#".to_string(),
            tag_custom_after: String::new(),
            double_spaced: true,
            highlight_export_template: "{{highlight}} {{comment}} {{tag}}".to_string(),
            fields_divider: ",".to_string(),
            name_format: "{{firstName}} {{lastName}}".to_string(),
            citations_format: CitationFormat::AuthorYearPage,
            citations_link: true,
            update_scope: UpdateScope::OnlyExistingNotes,
            last_update: DateTime::<Utc>::UNIX_EPOCH,
        }
    }
}

impl ImportConfig {
    /// Create a configuration with stock defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.import_file_name.is_empty() {
            return Err(Error::config_error("Note file name pattern cannot be empty"));
        }

        if !self
            .highlight_export_template
            .contains("{{highlight}}")
        {
            return Err(Error::config_error(
                "Highlight template must contain a {{highlight}} placeholder",
            ));
        }

        if self.tag_divider.is_empty() {
            return Err(Error::config_error("Tag divider cannot be empty"));
        }

        // Heading triggers must be distinct or classification is ambiguous
        let keys = [
            self.key_h1.as_str(),
            self.key_h2.as_str(),
            self.key_h3.as_str(),
            self.key_h4.as_str(),
            self.key_h5.as_str(),
            self.key_h6.as_str(),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in keys.iter().skip(i + 1) {
                if !a.is_empty() && a.eq_ignore_ascii_case(b) {
                    return Err(Error::config_error(format!(
                        "Duplicate heading trigger '{}'",
                        a
                    )));
                }
            }
        }

        Ok(())
    }

    /// Save the configuration to a YAML file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        tokio::fs::write(path, yaml).await?;
        Ok(())
    }

    /// Load a configuration from a YAML file, falling back to defaults when
    /// the file does not exist
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}
