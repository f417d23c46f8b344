//! The canonical component record.
//!
//! Every definition file, and every component nested inside one, normalizes
//! to a `Definition`: a fixed set of recognized fields the algorithm
//! inspects, plus an open `extra` map carrying arbitrary author-supplied
//! keys through untouched. Conversion from the raw value tree happens once,
//! at registry-insert time, after normalization has rewritten the shorthand
//! forms into canonical shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{DefError, DefResult};

/// A canonical component record keyed by its unique `path`.
///
/// # Invariants
///
/// - `path` is the unique identifier; `name` is the human label derived
///   from it when absent (`/` replaced by `-`).
/// - `build_depends` and `contents` hold path identifiers after
///   normalization; unresolved sibling names may remain as literal strings
///   (a documented ordering limitation of contents processing).
/// - `systems` stays nested as authored; it is identity-fixed but never
///   flattened into the registry.
/// - `tree` is attached post-load from the tree cache, not authored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
    /// Unique path identifier.
    pub path: String,

    /// Human-readable label.
    pub name: String,

    /// Ordered path identifiers this component requires. Children inherit
    /// their parent's list prepended to their own.
    #[serde(
        rename = "build-depends",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub build_depends: Vec<String>,

    /// Ordered child paths after flattening.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contents: Vec<String>,

    /// Nested system/subsystem structures, kept as authored.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub systems: Vec<Value>,

    /// Dependency-resolution tag. Its presence drives the wholesale
    /// overwrite rule on duplicate registry insertion.
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<Value>,

    /// Opaque resolved source-tree value from the tree cache.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree: Option<String>,

    /// Every other author-supplied key, preserved as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Definition {
    /// Convert a normalized value tree into a canonical record.
    ///
    /// # Errors
    ///
    /// Returns `DefError::Malformed` when the value is not a mapping or a
    /// recognized field has the wrong shape (non-string dependency entries,
    /// non-string `tree`, missing `path`/`name`).
    pub fn from_value(value: Value) -> DefResult<Self> {
        serde_json::from_value(value).map_err(|e| DefError::Malformed {
            detail: e.to_string(),
        })
    }

    /// Render the record as a plain key → value mapping, recognized fields
    /// and extras alike. Empty lists and absent options are omitted, so two
    /// records that differ only in unset fields compare equal field-wise.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            // A Definition always serializes to a mapping; nothing in the
            // record can fail JSON serialization.
            _ => Map::new(),
        }
    }
}
