//! Explicit session context.
//!
//! One `Session` value carries the configuration a load consumes — the scan
//! root, the definitions directory, the schema pair — plus the one piece of
//! state normalization mutates in place: the build target. Passing it by
//! reference replaces the global settings object the algorithm historically
//! leaned on.

use std::path::PathBuf;

/// Configuration and mutable state for one load session.
#[derive(Debug, Clone)]
pub struct Session {
    /// Root directory scanned for definition files.
    pub root: PathBuf,

    /// Definitions directory fingerprinted by the tree cache.
    pub defdir: PathBuf,

    /// Path to the meta-schema document.
    pub json_schema: PathBuf,

    /// Path to the definitions-schema document.
    pub defs_schema: PathBuf,

    /// Build target, by name or path. When normalization resolves a
    /// component whose name matches, this is rewritten to the component's
    /// path, so the target can be referred to either way.
    pub target: Option<String>,
}

impl Session {
    /// Create a session rooted at `root` with conventional defaults: the
    /// definitions directory is the root itself and the schema pair lives
    /// under `<root>/schemas/`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            defdir: root.clone(),
            json_schema: root.join("schemas").join("json-schema.json"),
            defs_schema: root.join("schemas").join("definitions-schema.json"),
            target: None,
            root,
        }
    }

    /// Rewrite the session target to `path` if it currently names `name`.
    pub fn resolve_target(&mut self, name: &str, path: &str) {
        if self.target.as_deref() == Some(name) {
            self.target = Some(path.to_string());
        }
    }
}
