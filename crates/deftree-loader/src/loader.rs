//! The load orchestrator.
//!
//! Walks the scan root for definition files, drives schema validation and
//! normalization per file, and re-attaches cached tree values at the end.
//! One `Definitions` value owns both the registry and the tree cache for
//! the rest of the session; `save_trees` persists the cache once the caller
//! has populated `tree` values on registry records.

use std::path::{Path, PathBuf};

use serde_json::Value;

use deftree_core::{load_yaml_value, Definition, Registry, Session};
use deftree_schema::SchemaValidator;

use crate::error::{LoadError, LoadResult};
use crate::normalize::Normalizer;
use crate::treecache::TreeCache;

/// Recognized definition-file extensions.
pub const DEFINITION_EXTENSIONS: [&str; 2] = ["def", "morph"];

/// Version-control metadata directory, skipped with its entire subtree.
const VCS_DIR: &str = ".git";

/// All definitions loaded from one tree, with their tree cache.
#[derive(Debug)]
pub struct Definitions {
    registry: Registry,
    cache: TreeCache,
    cache_valid: bool,
}

impl Definitions {
    /// Load every definition under `session.root`.
    ///
    /// Unreadable, unparsable, non-mapping, and malformed files are skipped
    /// with a warning. A component with no identity, or a schema violation
    /// when validation was required, aborts the whole load.
    pub fn load(session: &mut Session) -> LoadResult<Self> {
        let mut registry = Registry::new();
        let mut cache = TreeCache::new(&session.defdir);
        let cache_valid = cache.check();
        let validator = SchemaValidator::load(&session.json_schema, &session.defs_schema);

        let root = session.root.clone();
        for file in collect_definition_files(&root) {
            let value = match load_yaml_value(&file) {
                Ok(value) => value,
                Err(err) => {
                    tracing::warn!(file = %file.display(), error = %err, "problem loading definition");
                    continue;
                }
            };
            let Value::Object(mut document) = value else {
                tracing::warn!(file = %file.display(), "definition is not a mapping; skipping");
                continue;
            };

            // The file's own root-relative path becomes the provenance
            // path, before normalization inspects the document.
            let provenance = relative_path(&root, &file);
            document.insert("path".to_string(), Value::String(provenance.clone()));

            if !cache_valid {
                if let Some(validator) = &validator {
                    tracing::info!(file = %provenance, "validating schema");
                    validator
                        .validate(&Value::Object(document.clone()))
                        .map_err(|source| LoadError::SchemaViolation {
                            path: provenance.clone(),
                            source,
                        })?;
                }
            }

            let mut normalizer = Normalizer::new(&mut registry, session);
            match normalizer.normalize(Value::Object(document)) {
                Ok(_) => {}
                Err(err @ LoadError::MissingIdentity { .. }) => return Err(err),
                Err(err) => {
                    tracing::warn!(file = %provenance, error = %err, "skipping definition");
                }
            }
        }

        if cache_valid {
            for path in registry.paths() {
                let tree = cache.get(&path).map(str::to_string);
                registry.set_tree(&path, tree);
            }
        }

        Ok(Self {
            registry,
            cache,
            cache_valid,
        })
    }

    /// The flattened definitions table.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Mutable access to the table, e.g. for populating `tree` values
    /// before `save_trees`.
    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    /// The tree cache as loaded for this session.
    pub fn cache(&self) -> &TreeCache {
        &self.cache
    }

    /// Whether the tree cache was trusted for this load (and validation
    /// therefore skipped).
    pub fn tree_cache_valid(&self) -> bool {
        self.cache_valid
    }

    /// Look up a record by path.
    pub fn get_by_path(&self, path: &str) -> Option<&Definition> {
        self.registry.get_by_path(path)
    }

    /// Look up the canonical record for another record's path.
    pub fn get_by_record(&self, record: &Definition) -> Option<&Definition> {
        self.registry.get_by_record(record)
    }

    /// Persist the tree cache from the registry's current `tree` values.
    pub fn save_trees(&mut self) -> LoadResult<()> {
        self.cache.save(&self.registry)
    }
}

/// Recursively collect definition files under `root`, sorted for a
/// deterministic load order.
fn collect_definition_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    walk_definitions(root, &mut files);
    files.sort();
    files
}

fn walk_definitions(dir: &Path, acc: &mut Vec<PathBuf>) {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::warn!(dir = %dir.display(), error = %err, "failed to read directory during definition walk");
            return;
        }
    };
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "failed to read directory entry");
                continue;
            }
        };
        let path = entry.path();
        if path.is_dir() {
            if path.file_name().and_then(|n| n.to_str()) == Some(VCS_DIR) {
                continue;
            }
            walk_definitions(&path, acc);
        } else if has_definition_extension(&path) {
            acc.push(path);
        }
    }
}

fn has_definition_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map_or(false, |ext| DEFINITION_EXTENSIONS.contains(&ext))
}

/// The file's path relative to the scan root, with forward slashes.
fn relative_path(root: &Path, file: &Path) -> String {
    file.strip_prefix(root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}
