//! Core error types for journeysim configuration and I/O.
//!
//! Everything here is a configuration-time failure: it is raised before any
//! customer journey starts and aborts only the experiment it belongs to.
//! Running journeys never produce these; exhausted actions and "no decision"
//! are modelled as data, not errors.

use std::path::PathBuf;

use thiserror::Error;

/// Core error type for journeysim operations.
#[derive(Debug, Error)]
pub enum Error {
    // I/O errors
    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    #[error("failed to write file '{path}': {reason}")]
    FileWriteFailed { path: PathBuf, reason: String },

    #[error("failed to create directory '{path}': {reason}")]
    DirectoryCreationFailed { path: PathBuf, reason: String },

    // Parsing errors
    #[error("JSON parse error: {reason}")]
    JsonParseFailed { reason: String },

    #[error("TOML parse error: {reason}")]
    TomlParseFailed { reason: String },

    // Configuration errors
    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("unknown workflow variant: {variant}")]
    UnknownWorkflow { variant: String },

    #[error("catalog for workflow '{variant}' is empty")]
    EmptyCatalog { variant: String },

    #[error("catalog for workflow '{variant}' is malformed: {reason}")]
    MalformedCatalog { variant: String, reason: String },

    #[error("strategy '{name}' is malformed: {reason}")]
    MalformedStrategy { name: String, reason: String },

    #[error("disobedience probability must be within 0..=100, got {value}")]
    InvalidProbability { value: u32 },

    // Generic I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file write error.
    pub fn file_write_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileWriteFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a directory creation error.
    pub fn directory_creation_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DirectoryCreationFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json_parse_failed(reason: impl Into<String>) -> Self {
        Self::JsonParseFailed {
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            reason: reason.into(),
        }
    }

    /// Create an unknown strategy error.
    pub fn unknown_strategy(name: impl Into<String>) -> Self {
        Self::UnknownStrategy { name: name.into() }
    }

    /// Create an unknown workflow error.
    pub fn unknown_workflow(variant: impl Into<String>) -> Self {
        Self::UnknownWorkflow {
            variant: variant.into(),
        }
    }

    /// Create an empty catalog error.
    pub fn empty_catalog(variant: impl Into<String>) -> Self {
        Self::EmptyCatalog {
            variant: variant.into(),
        }
    }

    /// Create a malformed catalog error.
    pub fn malformed_catalog(variant: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedCatalog {
            variant: variant.into(),
            reason: reason.into(),
        }
    }

    /// Create a malformed strategy error.
    pub fn malformed_strategy(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedStrategy {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error belongs to the configuration of a single experiment
    /// (as opposed to an I/O failure of the surrounding run).
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownStrategy { .. }
                | Self::UnknownWorkflow { .. }
                | Self::EmptyCatalog { .. }
                | Self::MalformedCatalog { .. }
                | Self::MalformedStrategy { .. }
                | Self::InvalidProbability { .. }
        )
    }
}
