//! # deftree-core — Foundational Types for deftree
//!
//! This crate is the leaf of the deftree workspace. It defines the canonical
//! component record, the flattened definitions registry, the explicit session
//! context, and the YAML document-loading helpers that every other crate
//! builds on. It depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **One canonical record shape.** `Definition` has a fixed set of
//!    recognized fields plus an open `extra` map, so the algorithm gets type
//!    safety on the fields it inspects while arbitrary author-supplied keys
//!    pass through unchanged.
//!
//! 2. **The registry is the single owner.** All component records for one
//!    load session live in the `Registry`; inserts are safe to re-enter and
//!    merge duplicates instead of growing a pointer graph.
//!
//! 3. **Explicit session context.** Configuration (schema paths, definitions
//!    directory, the mutable build target) travels in a `Session` value
//!    passed by reference, never a process-wide singleton.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `deftree-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod definition;
pub mod document;
pub mod error;
pub mod registry;
pub mod session;

// Re-export primary types for ergonomic imports.
pub use definition::Definition;
pub use document::{load_yaml_value, yaml_to_json_value};
pub use error::{DefError, DefResult};
pub use registry::Registry;
pub use session::Session;
