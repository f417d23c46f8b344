//! Core error types.
//!
//! Structured errors for document loading and record conversion. All errors
//! carry file-path context where one exists so that a skipped definition can
//! be traced back to its source file.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the core document and record operations.
#[derive(Debug, Error)]
pub enum DefError {
    /// YAML parsing failed.
    #[error("failed to parse YAML at {path}: {source}")]
    YamlParse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    /// A required file was not found.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// The YAML document uses constructs with no JSON equivalent.
    #[error("non-JSON-compatible YAML at {path}: {detail}")]
    YamlIncompatible { path: PathBuf, detail: String },

    /// A mapping could not be converted into a canonical record.
    #[error("malformed definition: {detail}")]
    Malformed { detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for core operations.
pub type DefResult<T> = Result<T, DefError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_not_found_display() {
        let err = DefError::FileNotFound {
            path: PathBuf::from("/tmp/missing.def"),
        };
        assert!(format!("{err}").contains("/tmp/missing.def"));
    }

    #[test]
    fn malformed_display() {
        let err = DefError::Malformed {
            detail: "invalid type: integer".to_string(),
        };
        assert!(format!("{err}").contains("invalid type"));
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = DefError::from(io_err);
        assert!(format!("{err}").contains("access denied"));
    }
}
