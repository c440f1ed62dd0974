//! Error types for ProgInfo.
//!
//! Internal helpers propagate these with `?`. The public scan, mapping and
//! backup entry points log them and degrade to `None`/empty/`false` instead.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the ProgInfo library.
#[derive(Debug, Error)]
pub enum ProgInfoError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Registry errors
    #[error("Registry error at {path}: {message}")]
    Registry { path: String, message: String },

    #[error("Invalid registry path: {0}")]
    InvalidPath(String),

    // Mapping errors
    #[error("Conversion failed for {field}: {message}")]
    Conversion { field: String, message: String },

    // Backup errors
    #[error("Backup error: {message}")]
    Backup { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    // Process errors
    #[error("Failed to launch `{command}`: {message}")]
    LaunchFailed { command: String, message: String },

    #[error("Process timeout after {0:?}")]
    Timeout(Duration),

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for ProgInfo operations.
pub type Result<T> = std::result::Result<T, ProgInfoError>;

impl From<std::io::Error> for ProgInfoError {
    fn from(err: std::io::Error) -> Self {
        ProgInfoError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for ProgInfoError {
    fn from(err: serde_json::Error) -> Self {
        ProgInfoError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl ProgInfoError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        ProgInfoError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a conversion error for a named field.
    pub fn conversion(field: impl Into<String>, message: impl Into<String>) -> Self {
        ProgInfoError::Conversion {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a registry error for a key path.
    pub fn registry(path: impl Into<String>, message: impl Into<String>) -> Self {
        ProgInfoError::Registry {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error came from reading or converting a single value.
    ///
    /// Such errors only ever cost one field of one record.
    pub fn is_field_level(&self) -> bool {
        matches!(self, ProgInfoError::Conversion { .. })
    }
}
