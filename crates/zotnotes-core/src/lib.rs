//! # ZotNotes Core
//!
//! Core data models, error types, and configuration for the ZotNotes import
//! pipeline. This crate defines the canonical types that all other crates
//! depend on.
//!
//! ## Architecture Principles
//!
//! - **No heavy dependencies**: serde, regex and chrono only
//! - **Type-driven design**: closed enums replace the string tags of the
//!   data formats the pipeline ingests
//! - **Zero panic in libraries**: fallible operations return
//!   `Result<T, Error>`; the pipeline itself degrades instead of failing
//! - **Immutable configuration**: [`ImportConfig`] is loaded once and passed
//!   by reference through every stage
//!
//! ## Core Modules
//!
//! - [`models`] - Annotation records, creators, extraction sources
//! - [`library`] - Typed view of the Better-BibTeX JSON export
//! - [`error`] - Error type and Result alias
//! - [`config`] - The flat import/style configuration record
//!
//! ## Usage
//!
//! ```
//! use zotnotes_core::prelude::*;
//!
//! let mut record = AnnotationRecord::new(ExtractionSource::Zotero, "raw line");
//! record.kind = AnnotationKind::heading(2);
//! assert!(record.kind.is_directive());
//!
//! let config = ImportConfig::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod library;
pub mod models;

pub use config::{
    CitationFormat, ImageCommentPosition, ImportConfig, MissingFieldPolicy, SaveMode, UpdateScope,
};
pub use error::{Error, Result};
pub use library::{Attachment, ItemTag, Library, NoteExport, ReferenceEntry};
pub use models::{
    AnnotationKind, AnnotationRecord, Creator, CreatorRole, ExtractionSource, FormattedText,
    ZoteroInfo,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{
        CitationFormat, ImageCommentPosition, ImportConfig, MissingFieldPolicy, SaveMode,
        UpdateScope,
    };
    pub use crate::error::{Error, Result};
    pub use crate::library::{Attachment, ItemTag, Library, NoteExport, ReferenceEntry};
    pub use crate::models::{
        AnnotationKind, AnnotationRecord, Creator, CreatorRole, ExtractionSource, FormattedText,
        ZoteroInfo,
    };
}
