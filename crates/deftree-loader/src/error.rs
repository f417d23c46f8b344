//! Loader error types.
//!
//! The load taxonomy has exactly two fatal conditions; everything else is
//! logged and survived. `MissingIdentity` and `SchemaViolation` abort the
//! whole load with no partial result. `MalformedDocument` is recoverable at
//! the loader: the file is skipped and the walk continues.

use thiserror::Error;

/// Errors that can occur while loading a definition tree.
#[derive(Debug, Error)]
pub enum LoadError {
    /// A component with no path, no name, and no morph alias. Fatal.
    #[error("no path, no name in {context}")]
    MissingIdentity { context: String },

    /// Schema validation was required and the document failed it. Fatal.
    #[error("schema violation in {path}: {source}")]
    SchemaViolation {
        path: String,
        #[source]
        source: deftree_schema::SchemaError,
    },

    /// A document whose shape cannot become a canonical record.
    #[error("malformed definition in {path}: {detail}")]
    MalformedDocument { path: String, detail: String },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error reading or writing the tree cache.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_identity_display() {
        let err = LoadError::MissingIdentity {
            context: r#"{"repo":"upstream:gcc"}"#.to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("no path, no name"));
        assert!(msg.contains("upstream:gcc"));
    }

    #[test]
    fn malformed_document_display() {
        let err = LoadError::MalformedDocument {
            path: "strata/core.morph".to_string(),
            detail: "invalid type".to_string(),
        };
        assert!(format!("{err}").contains("strata/core.morph"));
    }
}
