//! Shared YAML document loading.
//!
//! Definition files are authored in YAML but processed uniformly as
//! `serde_json::Value` trees, so every consumer sees one value model
//! regardless of source syntax. Parsing goes through serde_yaml first, then
//! converts to JSON values; YAML constructs with no JSON equivalent are
//! rejected at the conversion boundary.

use std::path::Path;

use serde_json::Value;

use crate::error::{DefError, DefResult};

/// Load a YAML file and return it as a `serde_json::Value`.
///
/// # Errors
///
/// Returns `DefError::FileNotFound` for a missing file,
/// `DefError::YamlParse` for syntax errors, and `DefError::YamlIncompatible`
/// when the document uses YAML-only constructs.
pub fn load_yaml_value(path: &Path) -> DefResult<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DefError::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            DefError::Io(e)
        }
    })?;
    let yaml: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|e| DefError::YamlParse {
            path: path.to_path_buf(),
            source: e,
        })?;
    yaml_to_json_value(&yaml).map_err(|detail| DefError::YamlIncompatible {
        path: path.to_path_buf(),
        detail,
    })
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// YAML has a richer type system than JSON (tags, anchors, arbitrary map
/// keys); definition files use only the JSON-compatible subset. Non-string
/// map keys are stringified, matching YAML's loose authoring conventions.
pub fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: Result<Vec<Value>, String> = seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => {
            // Ignore YAML tags, just convert the inner value.
            yaml_to_json_value(&tagged.value)
        }
    }
}
