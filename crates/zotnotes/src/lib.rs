//! # ZotNotes
//!
//! Orchestration layer of the ZotNotes importer: loads a Better-BibTeX
//! JSON export, runs the annotation pipeline per entry, substitutes the
//! results into the note template, reconciles against an existing note
//! when overwriting is disabled, and writes the final Markdown file.
//!
//! The pipeline itself is synchronous string processing
//! (`zotnotes-parser` + `zotnotes-format`); this crate owns all file I/O
//! and keeps it at the boundary.
//!
//! ```no_run
//! use std::path::PathBuf;
//! use zotnotes::NoteImporter;
//! use zotnotes_core::ImportConfig;
//!
//! # async fn run() -> zotnotes_core::Result<()> {
//! let mut config = ImportConfig::default();
//! config.bib_path = PathBuf::from("library.json");
//! let importer = NoteImporter::new(config, PathBuf::from("/vault"))?;
//! let library = importer.load_library().await?;
//! importer.import_entry(&library, "smith2020").await?;
//! # Ok(())
//! # }
//! ```

use std::path::{Path, PathBuf};
use zotnotes_core::{
    ImportConfig, Library, ReferenceEntry, Result, SaveMode, UpdateScope, ZoteroInfo,
};
use zotnotes_format::creators::AuthorKeys;
use zotnotes_format::elements::format_note_elements;
use zotnotes_format::reconcile::reconcile;
use zotnotes_format::template::{
    insert_keyword_lists, note_title, render_metadata, replace_missing_fields,
};
use zotnotes_parser::parse_note;

/// Built-in note template, used when no template file is configured.
pub const DEFAULT_TEMPLATE: &str = "# {{title}}

## Metadata
- **CiteKey**: {{citeKey}}
- **Type**: {{itemType}}
- **Author**: {{author}}
- **Editor**: {{editor}}
- **Journal**: {{publicationTitle}}
- **Volume**: {{volume}}
- **Issue**: {{issue}}
- **Pages**: {{pages}}
- **Year**: {{year}}
- **DOI**: {{DOI}}

## Abstract
{{abstractNote}}

## Files and Links
- **Url**: {{url}}
- **File**: {{file}}
- **Local Library**: {{localLibrary}}

## Tags
- **Keywords**: {{keywordsAll}}

## Comments
{{UserNotes}}

## Annotations
{{PDFNotes}}
";

/// Everything the annotation pipeline extracted for one entry.
#[derive(Debug, Clone, Default)]
pub struct AnnotationExtract {
    /// Joined Markdown for `{{PDFNotes}}`
    pub extracted_annotations: String,
    /// Joined Markdown for `{{UserNotes}}`
    pub extracted_user_note: String,
    /// Keywords collected from keyword-type annotations
    pub extracted_keywords: Vec<String>,
    /// Joined Markdown for `{{Images}}`
    pub extracted_images: String,
    /// Image files to copy into the vault (source, target)
    pub image_copies: Vec<(PathBuf, PathBuf)>,
    /// Non-fatal problems encountered while formatting
    pub warnings: Vec<String>,
}

/// Run the annotation pipeline over every note of an entry.
///
/// Reader and Zotfile records share one formatting pass; user notes are
/// carried through as plain text.
pub fn extract_annotation(
    entry: &ReferenceEntry,
    config: &ImportConfig,
    vault_base: &Path,
) -> AnnotationExtract {
    let zotero_info = ZoteroInfo::detect(
        entry.attachments.first().map(|a| a.path.as_str()),
        &config.zotero_storage_path,
    );

    let mut pdf_records = Vec::new();
    let mut user_records = Vec::new();
    for note in &entry.notes {
        let (source, records) = parse_note(&note.note, config);
        match source {
            zotnotes_core::ExtractionSource::Zotero | zotnotes_core::ExtractionSource::Zotfile => {
                pdf_records.extend(records)
            }
            _ => user_records.extend(records),
        }
    }

    let outcome = format_note_elements(
        pdf_records,
        &entry.citation_key,
        config,
        &zotero_info,
        vault_base,
    );

    let user_lines: Vec<String> = user_records.into_iter().map(|r| r.row_edited).collect();

    AnnotationExtract {
        extracted_annotations: outcome.lines.join("\n"),
        extracted_user_note: user_lines.join("\n"),
        extracted_keywords: outcome.keywords,
        extracted_images: outcome.image_lines.join("\n"),
        image_copies: outcome.image_copies,
        warnings: outcome.warnings,
    }
}

/// Result of importing one entry.
#[derive(Debug, Clone)]
pub struct ImportReport {
    pub citation_key: String,
    pub path: PathBuf,
    pub warnings: Vec<String>,
}

/// Result of a batch library update.
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub updated: Vec<String>,
    pub failed: Vec<String>,
}

/// Imports entries from a library export into a vault of Markdown notes.
pub struct NoteImporter {
    config: ImportConfig,
    vault_base: PathBuf,
}

impl NoteImporter {
    /// Create an importer for a validated configuration and vault root.
    pub fn new(config: ImportConfig, vault_base: impl Into<PathBuf>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            vault_base: vault_base.into(),
        })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Load the Better-BibTeX JSON export configured in `bib_path`.
    pub async fn load_library(&self) -> Result<Library> {
        let path = &self.config.bib_path;
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(zotnotes_core::Error::library_not_found(path.clone()));
        }
        let raw = tokio::fs::read_to_string(path).await?;
        let library: Library = serde_json::from_str(&raw)?;
        log::debug!("loaded {} entries from {}", library.items.len(), path.display());
        Ok(library)
    }

    /// Path of the note generated for an entry.
    pub fn note_path(&self, entry: &ReferenceEntry) -> PathBuf {
        let keys = AuthorKeys::from_creators(&entry.creators);
        let title = note_title(entry, &keys, &self.config.import_file_name);
        self.vault_base
            .join(&self.config.import_path)
            .join(format!("{}.md", title))
    }

    async fn load_template(&self) -> String {
        if let Some(path) = &self.config.template_path {
            match tokio::fs::read_to_string(path).await {
                Ok(template) => return template,
                Err(err) => {
                    log::warn!(
                        "Cannot read template {}: {}. Using the built-in template.",
                        path.display(),
                        err
                    );
                }
            }
        }
        DEFAULT_TEMPLATE.to_string()
    }

    /// Generate (or refresh) the note for one entry and write it to disk.
    pub async fn create_note(&self, entry: &ReferenceEntry) -> Result<ImportReport> {
        let keys = AuthorKeys::from_creators(&entry.creators);
        let template = self.load_template().await;

        let mut note = render_metadata(entry, &self.config, &template);

        let extract = extract_annotation(entry, &self.config, &self.vault_base);
        note = note
            .replace("{{PDFNotes}}", &extract.extracted_annotations)
            .replace("{{UserNotes}}", &extract.extracted_user_note)
            .replace("{{Images}}", &extract.extracted_images);

        let library_tags: Vec<String> = entry.tags.iter().map(|t| t.tag.clone()).collect();
        note = insert_keyword_lists(
            &note,
            &library_tags,
            &extract.extracted_keywords,
            &self.config.fields_divider,
        );

        note = replace_missing_fields(
            &note,
            self.config.missing_field,
            &self.config.missing_field_replacement,
        );

        let path = self.note_path(entry);
        if self.config.save_manual_edits != SaveMode::OverwriteEntireNote {
            if let Ok(existing) = tokio::fs::read_to_string(&path).await {
                note = reconcile(&existing, &note, &keys.surname, &self.config);
            }
        }

        for (source, target) in &extract.image_copies {
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            if let Err(err) = tokio::fs::copy(source, target).await {
                log::warn!(
                    "Failed to copy image {} -> {}: {}",
                    source.display(),
                    target.display(),
                    err
                );
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &note).await?;
        log::info!("Imported {}", entry.citation_key);

        Ok(ImportReport {
            citation_key: entry.citation_key.clone(),
            path,
            warnings: extract.warnings,
        })
    }

    /// Import a single entry by citation key.
    pub async fn import_entry(&self, library: &Library, citation_key: &str) -> Result<ImportReport> {
        let entry = library
            .entry(citation_key)
            .ok_or_else(|| zotnotes_core::Error::entry_not_found(citation_key))?;
        self.create_note(entry).await
    }

    /// Refresh every note whose entry (or any of its notes) changed since
    /// the configured last update. Entries without citation keys are
    /// skipped; per-entry failures are collected, not fatal.
    pub async fn update_library(&self, library: &Library) -> Result<UpdateReport> {
        let mut report = UpdateReport::default();

        for entry in &library.items {
            if entry.citation_key.is_empty() {
                continue;
            }
            if let Some(modified) = entry.latest_modification() {
                if modified < self.config.last_update {
                    continue;
                }
            }
            let path = self.note_path(entry);
            if self.config.update_scope == UpdateScope::OnlyExistingNotes
                && !tokio::fs::try_exists(&path).await.unwrap_or(false)
            {
                continue;
            }

            match self.create_note(entry).await {
                Ok(_) => report.updated.push(entry.citation_key.clone()),
                Err(err) => {
                    log::warn!("Failed to update {}: {}", entry.citation_key, err);
                    report.failed.push(entry.citation_key.clone());
                }
            }
        }

        log::info!("Updated {} entries", report.updated.len());
        Ok(report)
    }
}
