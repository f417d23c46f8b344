//! # deftree-schema — Schema Validation Collaborator
//!
//! Wraps the `jsonschema` crate behind the contract the loader needs: a
//! validator built once per session from a configured meta-schema and
//! definitions-schema pair, reporting pass/fail with structured violations.
//!
//! Schema enforcement is best-effort by design: if either schema document is
//! missing, unparsable, or fails self-validation, construction yields `None`
//! and the loader proceeds without validation. A document that fails
//! validation when enforcement *is* active, however, is a fatal load error
//! for the caller.

pub mod validate;

pub use validate::{SchemaError, SchemaValidator, ValidationViolations, Violation};
