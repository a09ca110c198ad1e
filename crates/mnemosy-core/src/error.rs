//! Error types for the Mnemosy library core.
//!
//! Every registry operation reports failure through [`MnemosyError`]. The
//! variants split into two groups: rejections (the request was structurally
//! illegal and nothing was touched) and failures (the filesystem, the
//! metadata files or the collection store misbehaved).

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Mnemosy library core.
#[derive(Debug, Error)]
pub enum MnemosyError {
    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    // Structural errors
    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("Name collision: '{name}' already exists in '{parent}'")]
    NameCollision { name: String, parent: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    // Library data errors
    #[error("Corrupt library data at {path}: {message}")]
    CorruptLibraryData { path: PathBuf, message: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Collection store errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    // Thumbnail errors
    #[error("Image error: {message}")]
    Image { message: String },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

/// Result type alias for Mnemosy operations.
pub type Result<T> = std::result::Result<T, MnemosyError>;

impl From<std::io::Error> for MnemosyError {
    fn from(err: std::io::Error) -> Self {
        MnemosyError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for MnemosyError {
    fn from(err: serde_json::Error) -> Self {
        MnemosyError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for MnemosyError {
    fn from(err: rusqlite::Error) -> Self {
        MnemosyError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<image::ImageError> for MnemosyError {
    fn from(err: image::ImageError) -> Self {
        MnemosyError::Image {
            message: err.to_string(),
        }
    }
}

impl MnemosyError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        MnemosyError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create an IO error with a custom message and path context.
    pub fn io_context(message: impl Into<String>, path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        MnemosyError::Io {
            message: message.into(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        MnemosyError::InvalidOperation {
            message: message.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        MnemosyError::NotFound { what: what.into() }
    }

    /// Whether the request was rejected before any side effect.
    ///
    /// Rejections are logged as warnings; everything else is a failure of
    /// the environment and is logged as an error.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            MnemosyError::InvalidOperation { .. }
                | MnemosyError::NameCollision { .. }
                | MnemosyError::NotFound { .. }
                | MnemosyError::InvalidPath { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MnemosyError::NameCollision {
            name: "Bricks".into(),
            parent: "Root".into(),
        };
        assert_eq!(
            err.to_string(),
            "Name collision: 'Bricks' already exists in 'Root'"
        );
    }

    #[test]
    fn test_rejection_classification() {
        assert!(MnemosyError::invalid_operation("move under descendant").is_rejection());
        assert!(MnemosyError::not_found("folder 7").is_rejection());
        assert!(!MnemosyError::CorruptLibraryData {
            path: PathBuf::from("/lib"),
            message: "bad".into(),
        }
        .is_rejection());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!MnemosyError::io_with_path(io, "/lib").is_rejection());
    }

    #[test]
    fn test_io_conversion_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MnemosyError = io.into();
        assert!(matches!(err, MnemosyError::Io { source: Some(_), path: None, .. }));
    }
}
