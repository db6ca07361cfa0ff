//! # ZotNotes Format
//!
//! Markdown rendering for the ZotNotes pipeline: creator display strings,
//! per-annotation styling and directive resolution, template substitution
//! for note metadata, and reconciliation of freshly generated notes
//! against manually edited ones.
//!
//! ## Modules
//!
//! - [`creators`] - author/editor lists in three name modes
//! - [`style`] - decoration fragments derived from the style toggles
//! - [`elements`] - the element formatter ([`format_note_elements`])
//! - [`template`] - `{{field}}` substitution, keyword lists, note titles
//! - [`reconcile`] - substring-probe merge of old and new notes
//!
//! ## Flow
//!
//! ```
//! use std::path::Path;
//! use zotnotes_core::{ImportConfig, ZoteroInfo};
//! use zotnotes_parser::parse_note;
//! use zotnotes_format::format_note_elements;
//!
//! let mut config = ImportConfig::default();
//! config.double_spaced = false;
//! let note = r#"<p>"A finding" (<a href="zotero://open-pdf/library/items/K?page=3">Smith, 2020, p. 3</a>)</p>"#;
//! let (_, records) = parse_note(note, &config);
//!
//! let outcome = format_note_elements(
//!     records,
//!     "smith2020",
//!     &config,
//!     &ZoteroInfo::default(),
//!     Path::new("/vault"),
//! );
//! assert!(outcome.lines[0].contains("A finding"));
//! ```

pub mod creators;
pub mod elements;
pub mod reconcile;
pub mod style;
pub mod template;

pub use creators::{creator_key, format_creator_name, AuthorKeys, NameMode};
pub use elements::{format_note_elements, FormatOutcome};
pub use reconcile::{merge_notes, reconcile};
pub use style::StyleSet;
pub use template::{note_title, render_metadata};

/// Convenient prelude for common imports.
pub mod prelude {
    pub use crate::creators::{creator_key, AuthorKeys, NameMode};
    pub use crate::elements::{format_note_elements, FormatOutcome};
    pub use crate::reconcile::reconcile;
    pub use crate::style::StyleSet;
    pub use crate::template::{
        insert_keyword_lists, note_title, render_metadata, replace_missing_fields,
    };
}
