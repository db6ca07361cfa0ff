//! Error types for the ZotNotes import pipeline.
//!
//! All errors in the system are represented by the [`Error`] enum.
//! The annotation pipeline itself never fails: malformed fields degrade to
//! empty values and missing images become warnings. Errors surface only at
//! the orchestration boundary (library loading, template loading, note
//! write-back).

use std::io;
use std::path::PathBuf;
use thiserror::Error as ThisError;

/// The core error type for all ZotNotes operations.
#[derive(ThisError, Debug)]
pub enum Error {
    /// File system error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed library export
    #[error("Library parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed configuration file
    #[error("Configuration parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Library export file not found
    #[error("Library export not found: {path}")]
    LibraryNotFound { path: PathBuf },

    /// No entry with the requested citation key
    #[error("No entry with citation key '{key}' in the library")]
    EntryNotFound { key: String },

    /// Invalid configuration
    #[error("Configuration error: {reason}")]
    ConfigError { reason: String },

    /// Template could not be loaded or substituted
    #[error("Template error: {reason}")]
    TemplateError { reason: String },

    /// Generic unclassified error
    #[error("Error: {0}")]
    Other(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a library-not-found error
    pub fn library_not_found(path: impl Into<PathBuf>) -> Self {
        Error::LibraryNotFound { path: path.into() }
    }

    /// Create an entry-not-found error
    pub fn entry_not_found(key: impl Into<String>) -> Self {
        Error::EntryNotFound { key: key.into() }
    }

    /// Create a configuration error
    pub fn config_error(reason: impl Into<String>) -> Self {
        Error::ConfigError {
            reason: reason.into(),
        }
    }

    /// Create a template error
    pub fn template_error(reason: impl Into<String>) -> Self {
        Error::TemplateError {
            reason: reason.into(),
        }
    }

    /// Create a generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::entry_not_found("smith2020");
        assert!(err.to_string().contains("smith2020"));

        let err = Error::config_error("empty heading trigger");
        assert!(err.to_string().contains("Configuration error"));
    }
}
