//! Runtime validation of definition documents against the configured
//! schema pair.
//!
//! Two documents are configured per session: a meta-schema and a
//! definitions-schema. At construction the meta-schema must validate
//! against itself and the definitions-schema against the meta-schema;
//! only then is the definitions-schema compiled into a validator. Any
//! failure along the way disables enforcement for the session instead of
//! aborting it.

use std::fmt;
use std::path::{Path, PathBuf};

use jsonschema::Validator;
use serde_json::Value;
use thiserror::Error;

use deftree_core::load_yaml_value;

/// Error raised when an enforced validation fails.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The document did not conform to the definitions schema.
    #[error("validation failed against {schema}:\n{violations}")]
    ValidationFailed {
        /// Path of the schema that was validated against.
        schema: String,
        /// Structured list of individual violations.
        violations: ValidationViolations,
    },
}

/// A single validation violation with structured context.
#[derive(Debug, Clone)]
pub struct Violation {
    /// JSON Pointer path to the violating field in the instance.
    pub instance_path: String,
    /// Human-readable description of the violation.
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance_path.is_empty() {
            write!(f, "  (root): {}", self.message)
        } else {
            write!(f, "  {}: {}", self.instance_path, self.message)
        }
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone)]
pub struct ValidationViolations {
    violations: Vec<Violation>,
}

impl ValidationViolations {
    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

impl fmt::Display for ValidationViolations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}

/// A compiled validator for the configured definitions schema.
pub struct SchemaValidator {
    validator: Validator,
    source: PathBuf,
}

impl fmt::Debug for SchemaValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaValidator")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl SchemaValidator {
    /// Build a validator from the configured schema pair.
    ///
    /// Returns `None` — schema enforcement silently skipped — when either
    /// document is missing or unparsable, when the meta-schema does not
    /// validate against itself, when the definitions-schema does not
    /// validate against the meta-schema, or when compilation fails. The
    /// reason is debug-logged.
    pub fn load(json_schema: &Path, defs_schema: &Path) -> Option<Self> {
        let meta = match load_yaml_value(json_schema) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "skipping schema enforcement: no meta-schema");
                return None;
            }
        };
        let defs = match load_yaml_value(defs_schema) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, "skipping schema enforcement: no definitions-schema");
                return None;
            }
        };

        let meta_validator = match jsonschema::validator_for(&meta) {
            Ok(validator) => validator,
            Err(err) => {
                tracing::debug!(error = %err, "skipping schema enforcement: meta-schema does not compile");
                return None;
            }
        };
        if !meta_validator.is_valid(&meta) {
            tracing::debug!("skipping schema enforcement: meta-schema fails self-validation");
            return None;
        }
        if !meta_validator.is_valid(&defs) {
            tracing::debug!("skipping schema enforcement: definitions-schema fails meta-schema");
            return None;
        }

        let validator = match jsonschema::validator_for(&defs) {
            Ok(validator) => validator,
            Err(err) => {
                tracing::debug!(error = %err, "skipping schema enforcement: definitions-schema does not compile");
                return None;
            }
        };

        Some(Self {
            validator,
            source: defs_schema.to_path_buf(),
        })
    }

    /// Path of the definitions-schema this validator was compiled from.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Validate a definition document.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::ValidationFailed` with structured violation
    /// details when the document does not conform.
    pub fn validate(&self, instance: &Value) -> Result<(), SchemaError> {
        let violations: Vec<Violation> = self
            .validator
            .iter_errors(instance)
            .map(|e| Violation {
                instance_path: e.instance_path.to_string(),
                message: e.to_string(),
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::ValidationFailed {
                schema: self.source.display().to_string(),
                violations: ValidationViolations { violations },
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write_schemas(dir: &Path, meta: &str, defs: &str) -> (PathBuf, PathBuf) {
        let meta_path = dir.join("json-schema.json");
        let defs_path = dir.join("definitions-schema.json");
        std::fs::write(&meta_path, meta).unwrap();
        std::fs::write(&defs_path, defs).unwrap();
        (meta_path, defs_path)
    }

    #[test]
    fn load_skips_when_schemas_missing() {
        let dir = tempfile::tempdir().unwrap();
        let validator = SchemaValidator::load(
            &dir.path().join("absent-meta.json"),
            &dir.path().join("absent-defs.json"),
        );
        assert!(validator.is_none());
    }

    #[test]
    fn load_skips_when_defs_schema_fails_meta() {
        let dir = tempfile::tempdir().unwrap();
        // Meta-schema admits only objects; the defs document is a list.
        let (meta, defs) = write_schemas(dir.path(), r#"{"type": "object"}"#, "- not\n- a-schema\n");
        assert!(SchemaValidator::load(&meta, &defs).is_none());
    }

    #[test]
    fn load_skips_when_defs_schema_does_not_compile() {
        let dir = tempfile::tempdir().unwrap();
        let (meta, defs) = write_schemas(
            dir.path(),
            r#"{"type": "object"}"#,
            r#"{"type": "no-such-type"}"#,
        );
        assert!(SchemaValidator::load(&meta, &defs).is_none());
    }

    #[test]
    fn validate_accepts_conforming_document() {
        let dir = tempfile::tempdir().unwrap();
        let (meta, defs) = write_schemas(
            dir.path(),
            r#"{"type": "object"}"#,
            r#"{"type": "object", "required": ["name"]}"#,
        );
        let validator = SchemaValidator::load(&meta, &defs).unwrap();
        validator.validate(&json!({"name": "base"})).unwrap();
    }

    #[test]
    fn validate_reports_structured_violations() {
        let dir = tempfile::tempdir().unwrap();
        let (meta, defs) = write_schemas(
            dir.path(),
            r#"{"type": "object"}"#,
            r#"{"type": "object", "required": ["name"]}"#,
        );
        let validator = SchemaValidator::load(&meta, &defs).unwrap();

        let err = validator.validate(&json!({"path": "x"})).unwrap_err();
        match &err {
            SchemaError::ValidationFailed { violations, .. } => {
                assert!(!violations.is_empty());
                let mentions_name = violations
                    .violations()
                    .iter()
                    .any(|v| v.message.contains("name"));
                assert!(mentions_name, "expected a violation mentioning 'name'");
            }
        }
    }

    #[test]
    fn schemas_may_be_authored_as_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let (meta, defs) = write_schemas(
            dir.path(),
            "type: object\n",
            "type: object\nrequired:\n  - name\n",
        );
        let validator = SchemaValidator::load(&meta, &defs).unwrap();
        assert!(validator.validate(&json!({"kind": "x"})).is_err());
    }

    #[test]
    fn violation_display_root() {
        let v = Violation {
            instance_path: String::new(),
            message: r#""name" is a required property"#.to_string(),
        };
        assert!(v.to_string().contains("(root)"));
    }

    #[test]
    fn violation_display_with_path() {
        let v = Violation {
            instance_path: "/contents/0".to_string(),
            message: "not of type string".to_string(),
        };
        let display = v.to_string();
        assert!(display.contains("/contents/0"));
        assert!(display.contains("not of type string"));
    }
}
