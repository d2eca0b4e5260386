//! Error types for flowedit.
//!
//! All errors surfaced by the editing session are represented by the
//! `EditorError` enum. None of them is fatal: the graph stays editable
//! whatever happens to persistence, import or export.

use std::io::ErrorKind;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for all flowedit operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum EditorError {
    /// Malformed import file or missing required node configuration.
    #[error("{0}")]
    Validation(String),

    /// A save or execute was attempted without an authenticated identity.
    #[error("authentication required")]
    AuthRequired,

    /// Backend request failures (network, HTTP status, bad payload).
    #[error("{0}")]
    Backend(String),

    /// Data conversion errors (JSON encoding of nodes and edges).
    #[error("{0}")]
    Convert(String),

    /// Configuration parsing errors.
    #[error("{0}")]
    Config(String),

    /// Session lifecycle errors (no runtime, torn down, unsaved document).
    #[error("{0}")]
    Session(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl From<EditorError> for String {
    fn from(val: EditorError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for EditorError {
    fn from(error: std::io::Error) -> Self {
        EditorError::IoError(error.to_string())
    }
}

impl From<EditorError> for std::io::Error {
    fn from(val: EditorError) -> Self {
        #[allow(clippy::io_other_error)]
        std::io::Error::new(ErrorKind::Other, val.to_string())
    }
}

impl From<serde_json::Error> for EditorError {
    fn from(error: serde_json::Error) -> Self {
        EditorError::Convert(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for EditorError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        EditorError::Validation(error.to_string())
    }
}

impl From<reqwest::Error> for EditorError {
    fn from(error: reqwest::Error) -> Self {
        EditorError::Backend(error.to_string())
    }
}

impl From<toml::de::Error> for EditorError {
    fn from(error: toml::de::Error) -> Self {
        EditorError::Config(error.to_string())
    }
}
