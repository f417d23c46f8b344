//! The flattened definitions table.
//!
//! One registry owns every component record for the lifetime of a load
//! session. It is a single arena keyed by path, mutated only through
//! `insert`, which is safe to re-enter from the normalizer's recursion:
//! inserting a path twice merges the newcomer into the existing record
//! instead of building a pointer graph.
//!
//! ## Merge Invariants
//!
//! - At most one canonical record per path.
//! - A second insertion contributes keys the first lacked.
//! - A mismatched value for any shared key is a non-fatal warning; both
//!   versions are logged and the earlier value wins.
//! - Exception: when only the newcomer carries a `ref` tag, its fields
//!   overwrite the existing record wholesale.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::definition::Definition;

/// Mapping from path → canonical component record.
#[derive(Debug, Default)]
pub struct Registry {
    defs: BTreeMap<String, Definition>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record, merging with any existing record at the same path.
    /// Returns the path under which the record is registered.
    pub fn insert(&mut self, incoming: Definition) -> String {
        let path = incoming.path.clone();
        let existing = match self.defs.entry(path.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(incoming);
                return path;
            }
            Entry::Occupied(slot) => slot.into_mut(),
        };

        let old_map = existing.to_map();
        let new_map = incoming.to_map();

        for (field, new_value) in &new_map {
            if let Some(old_value) = old_map.get(field) {
                if old_value != new_value {
                    tracing::warn!(path = %path, field = %field, "multiple definitions of field");
                    tracing::warn!("{old_value} | {new_value}");
                }
            }
        }

        let overwrite = incoming.reference.is_some() && existing.reference.is_none();
        let mut merged = old_map;
        for (field, new_value) in new_map {
            if overwrite {
                merged.insert(field, new_value);
            } else {
                merged.entry(field).or_insert(new_value);
            }
        }

        match Definition::from_value(Value::Object(merged)) {
            Ok(def) => *existing = def,
            Err(err) => {
                tracing::warn!(path = %path, error = %err, "could not merge duplicate definition")
            }
        }
        path
    }

    /// Look up a record by its path identifier.
    pub fn get_by_path(&self, path: &str) -> Option<&Definition> {
        self.defs.get(path)
    }

    /// Look up the canonical record registered for another record's path.
    pub fn get_by_record(&self, record: &Definition) -> Option<&Definition> {
        self.defs.get(&record.path)
    }

    /// Replace a record's `tree` value. A no-op for unknown paths.
    pub fn set_tree(&mut self, path: &str, tree: Option<String>) {
        if let Some(def) = self.defs.get_mut(path) {
            def.tree = tree;
        }
    }

    /// Iterate records in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Definition)> {
        self.defs.iter()
    }

    /// All registered paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.defs.keys().cloned().collect()
    }

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Returns true if no records are registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
