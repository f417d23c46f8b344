//! The normalization and flattening algorithm.
//!
//! Definition files grew up around several generations of authoring
//! shorthand: components identified by `path`, `morph`, or just `name`;
//! child lists under `contents`, `chunks`, or `strata`; dependencies named
//! by sibling label rather than path. The normalizer rewrites one raw
//! document into canonical shape and flattens every component it discovers
//! into the shared registry, returning the document's own path.
//!
//! ## Ordering limitation
//!
//! Sibling-name dependency resolution covers *earlier* siblings in authored
//! order only. Forward references, and a component's reference to its own
//! name, stay as literal strings. Downstream consumers rely on exactly this
//! behavior; do not widen the lookup.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use deftree_core::{Definition, Registry, Session};

use crate::error::{LoadError, LoadResult};

/// Legacy aliases for the `contents` field, in processing order: when more
/// than one is present the later-processed alias wins.
const LEGACY_CONTENT_KEYS: [&str; 2] = ["chunks", "strata"];

/// Rewrites raw documents into canonical shape and inserts every discovered
/// component into the registry.
pub struct Normalizer<'a> {
    registry: &'a mut Registry,
    session: &'a mut Session,
}

impl<'a> Normalizer<'a> {
    /// Create a normalizer inserting into `registry`, resolving the build
    /// target through `session`.
    pub fn new(registry: &'a mut Registry, session: &'a mut Session) -> Self {
        Self { registry, session }
    }

    /// Normalize one raw document and insert it (and every nested
    /// component) into the registry. Returns the document's path.
    ///
    /// # Errors
    ///
    /// `LoadError::MissingIdentity` when a component has no path, name, or
    /// morph alias anywhere in the chain — fatal for the whole load.
    /// `LoadError::MalformedDocument` when the document itself cannot
    /// become a canonical record — recoverable; the caller skips the file.
    pub fn normalize(&mut self, document: Value) -> LoadResult<String> {
        match document {
            Value::Object(map) => self.normalize_map(map),
            other => Err(LoadError::MalformedDocument {
                path: "<document>".to_string(),
                detail: format!("definition is not a mapping: {other}"),
            }),
        }
    }

    fn normalize_map(&mut self, mut this: Map<String, Value>) -> LoadResult<String> {
        self.fix_path_name(&mut this)?;
        self.fix_systems(&mut this)?;
        self.normalize_build_depends(&mut this)?;
        rename_legacy_contents(&mut this);
        self.flatten_contents(&mut this)?;
        self.insert_document(this)
    }

    /// Identity fix-up: derive `path` from `morph` or `name`, derive `name`
    /// from `path`, and resolve the session build target.
    fn fix_path_name(&mut self, this: &mut Map<String, Value>) -> LoadResult<()> {
        let path = match this.get("path").and_then(Value::as_str) {
            Some(path) => path.to_string(),
            None => {
                let derived = match this.get("morph") {
                    Some(Value::String(morph)) => {
                        let morph = morph.clone();
                        this.remove("morph");
                        morph
                    }
                    _ => match this.get("name").and_then(Value::as_str) {
                        Some(name) => name.to_string(),
                        None => {
                            return Err(LoadError::MissingIdentity {
                                context: describe(this),
                            })
                        }
                    },
                };
                this.insert("path".to_string(), Value::String(derived.clone()));
                derived
            }
        };

        let name = match this.get("name").and_then(Value::as_str) {
            Some(name) => name.to_string(),
            None => {
                let name = path.replace('/', "-");
                this.insert("name".to_string(), Value::String(name.clone()));
                name
            }
        };

        self.session.resolve_target(&name, &path);
        Ok(())
    }

    /// Identity-fix every entry of `systems` and its nested `subsystems`
    /// lists, to arbitrary depth. These stay nested as authored; nothing
    /// here reaches the registry.
    fn fix_systems(&mut self, this: &mut Map<String, Value>) -> LoadResult<()> {
        if let Some(Value::Array(systems)) = this.get_mut("systems") {
            for system in systems {
                self.fix_system(system)?;
            }
        }
        Ok(())
    }

    fn fix_system(&mut self, system: &mut Value) -> LoadResult<()> {
        let Value::Object(map) = system else {
            tracing::warn!("ignoring non-mapping system entry");
            return Ok(());
        };
        self.fix_path_name(map)?;
        if let Some(Value::Array(subsystems)) = map.get_mut("subsystems") {
            for subsystem in subsystems {
                self.fix_system(subsystem)?;
            }
        }
        Ok(())
    }

    /// Normalize the top-level `build-depends` list: each mapping entry is
    /// identity-fixed, recursively normalized into the registry, and
    /// replaced by the path it registered under. String entries are already
    /// path references and pass through.
    fn normalize_build_depends(&mut self, this: &mut Map<String, Value>) -> LoadResult<()> {
        let entries = match this.remove("build-depends") {
            None => return Ok(()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                tracing::warn!(component = %describe(this), "ignoring non-list build-depends");
                this.insert("build-depends".to_string(), other);
                return Ok(());
            }
        };

        let mut resolved = Vec::with_capacity(entries.len());
        for entry in entries {
            match entry {
                Value::Object(mut dependency) => {
                    self.fix_path_name(&mut dependency)?;
                    match self.normalize_map(dependency) {
                        Ok(path) => resolved.push(Value::String(path)),
                        Err(err @ LoadError::MissingIdentity { .. }) => return Err(err),
                        Err(err) => {
                            tracing::warn!(error = %err, "skipping malformed build dependency");
                        }
                    }
                }
                Value::String(path) => resolved.push(Value::String(path)),
                other => {
                    tracing::warn!(entry = %other, "ignoring malformed build-depends entry");
                    resolved.push(other);
                }
            }
        }
        this.insert("build-depends".to_string(), Value::Array(resolved));
        Ok(())
    }

    /// Flatten the `contents` list: each child is identity-fixed, gets
    /// earlier-sibling dependency names rewritten to paths, inherits the
    /// parent's `build-depends` prepended to its own, and is inserted into
    /// the registry with its list entry replaced by the returned path.
    fn flatten_contents(&mut self, this: &mut Map<String, Value>) -> LoadResult<()> {
        let entries = match this.remove("contents") {
            None => return Ok(()),
            Some(Value::Array(entries)) => entries,
            Some(other) => {
                tracing::warn!(component = %describe(this), "ignoring non-list contents");
                this.insert("contents".to_string(), other);
                return Ok(());
            }
        };

        let parent_name = this
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let parent_depends = match this.get("build-depends") {
            Some(Value::Array(depends)) => depends.clone(),
            _ => Vec::new(),
        };

        let mut lookup: BTreeMap<String, String> = BTreeMap::new();
        let mut flattened = Vec::with_capacity(entries.len());
        for entry in entries {
            let mut component = match entry {
                Value::Object(map) => map,
                other => {
                    tracing::warn!(parent = %parent_name, entry = %other, "ignoring non-mapping contents entry");
                    flattened.push(other);
                    continue;
                }
            };

            self.fix_path_name(&mut component)?;
            let child_name = component
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let child_path = component
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();

            if child_name == parent_name {
                tracing::warn!(parent = %parent_name, child = %child_name, "component contains itself");
            }

            // Earlier siblings only: the lookup does not yet know this
            // component's own name, so self and forward references stay
            // literal.
            if let Some(Value::Array(depends)) = component.get_mut("build-depends") {
                for dependency in depends.iter_mut() {
                    if let Value::String(name) = dependency {
                        if let Some(path) = lookup.get(name.as_str()) {
                            *dependency = Value::String(path.clone());
                        }
                    }
                }
            }

            // Parent dependencies apply transitively to every direct child.
            let child_depends = match component.remove("build-depends") {
                Some(Value::Array(depends)) => depends,
                Some(other) => {
                    tracing::warn!(child = %child_name, entry = %other, "ignoring non-list build-depends");
                    Vec::new()
                }
                None => Vec::new(),
            };
            let mut combined = parent_depends.clone();
            combined.extend(child_depends);
            component.insert("build-depends".to_string(), Value::Array(combined));

            lookup.insert(child_name, child_path);

            if let Some(path) = self.insert_component(component) {
                flattened.push(Value::String(path));
            }
        }
        this.insert("contents".to_string(), Value::Array(flattened));
        Ok(())
    }

    /// Convert a nested component into a canonical record and insert it.
    /// Malformed components are skipped with a warning; the load continues.
    fn insert_component(&mut self, component: Map<String, Value>) -> Option<String> {
        let context = describe(&component);
        match Definition::from_value(Value::Object(component)) {
            Ok(def) => Some(self.registry.insert(def)),
            Err(err) => {
                tracing::warn!(component = %context, error = %err, "skipping malformed component record");
                None
            }
        }
    }

    /// Insert the document itself. Unlike nested components, a document
    /// that cannot become a canonical record is reported to the caller.
    fn insert_document(&mut self, this: Map<String, Value>) -> LoadResult<String> {
        let context = describe(&this);
        let def =
            Definition::from_value(Value::Object(this)).map_err(|err| LoadError::MalformedDocument {
                path: context,
                detail: err.to_string(),
            })?;
        Ok(self.registry.insert(def))
    }
}

/// Rename the legacy `chunks`/`strata` aliases to the canonical `contents`
/// field. When more than one list is present the later-processed alias
/// replaces the earlier value — ambiguous input, warned and survived.
fn rename_legacy_contents(this: &mut Map<String, Value>) {
    for key in LEGACY_CONTENT_KEYS {
        if let Some(value) = this.remove(key) {
            if this.contains_key("contents") {
                tracing::warn!(component = %describe(this), alias = key, "multiple content lists; later alias wins");
            }
            this.insert("contents".to_string(), value);
        }
    }
}

/// Compact description of a raw component for log and error context:
/// its name, else its path, else the whole mapping as JSON.
fn describe(this: &Map<String, Value>) -> String {
    this.get("name")
        .and_then(Value::as_str)
        .or_else(|| this.get("path").and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| Value::Object(this.clone()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn normalize_one(document: Value) -> (Registry, Session, LoadResult<String>) {
        let mut registry = Registry::new();
        let mut session = Session::new("/work");
        let result = Normalizer::new(&mut registry, &mut session).normalize(document);
        (registry, session, result)
    }

    #[test]
    fn name_only_yields_path_equal_to_name() {
        let (registry, _, result) = normalize_one(json!({"name": "base"}));
        assert_eq!(result.unwrap(), "base");
        let def = registry.get_by_path("base").unwrap();
        assert_eq!(def.name, "base");
    }

    #[test]
    fn path_only_derives_name_with_dashes() {
        let (registry, _, result) = normalize_one(json!({"path": "strata/core.morph"}));
        assert_eq!(result.unwrap(), "strata/core.morph");
        let def = registry.get_by_path("strata/core.morph").unwrap();
        assert_eq!(def.name, "strata-core.morph");
    }

    #[test]
    fn morph_alias_wins_over_name() {
        let (registry, _, result) =
            normalize_one(json!({"morph": "strata/core.morph", "name": "core"}));
        assert_eq!(result.unwrap(), "strata/core.morph");
        let def = registry.get_by_path("strata/core.morph").unwrap();
        assert_eq!(def.name, "core");
        assert!(!def.extra.contains_key("morph"));
    }

    #[test]
    fn missing_identity_is_fatal() {
        let (_, _, result) = normalize_one(json!({"repo": "upstream:gcc"}));
        assert!(matches!(result, Err(LoadError::MissingIdentity { .. })));
    }

    #[test]
    fn non_mapping_document_is_malformed() {
        let (_, _, result) = normalize_one(json!(["not", "a", "mapping"]));
        assert!(matches!(result, Err(LoadError::MalformedDocument { .. })));
    }

    #[test]
    fn target_name_is_rewritten_to_path() {
        let mut registry = Registry::new();
        let mut session = Session::new("/work");
        session.target = Some("core".to_string());
        Normalizer::new(&mut registry, &mut session)
            .normalize(json!({"path": "strata/core.morph", "name": "core"}))
            .unwrap();
        assert_eq!(session.target.as_deref(), Some("strata/core.morph"));
    }

    #[test]
    fn contents_flatten_into_three_records() {
        let (registry, _, result) = normalize_one(json!({
            "name": "stratum",
            "contents": [{"name": "a"}, {"name": "b"}],
        }));
        assert_eq!(result.unwrap(), "stratum");
        assert_eq!(registry.len(), 3);
        let parent = registry.get_by_path("stratum").unwrap();
        assert_eq!(parent.contents, vec!["a", "b"]);
        assert!(registry.get_by_path("a").is_some());
        assert!(registry.get_by_path("b").is_some());
    }

    #[test]
    fn children_inherit_parent_dependencies_first() {
        let (registry, _, _) = normalize_one(json!({
            "name": "stratum",
            "build-depends": ["x"],
            "contents": [{"name": "child", "build-depends": ["y"]}],
        }));
        let child = registry.get_by_path("child").unwrap();
        assert_eq!(child.build_depends, vec!["x", "y"]);
    }

    #[test]
    fn earlier_sibling_names_resolve_to_paths() {
        let (registry, _, _) = normalize_one(json!({
            "name": "stratum",
            "contents": [
                {"name": "a", "path": "pa"},
                {"name": "b", "build-depends": ["a"]},
            ],
        }));
        let b = registry.get_by_path("b").unwrap();
        assert_eq!(b.build_depends, vec!["pa"]);
    }

    #[test]
    fn forward_and_self_references_stay_literal() {
        let (registry, _, _) = normalize_one(json!({
            "name": "stratum",
            "contents": [
                {"name": "a", "path": "pa", "build-depends": ["b", "a"]},
                {"name": "b", "path": "pb"},
            ],
        }));
        let a = registry.get_by_path("pa").unwrap();
        assert_eq!(a.build_depends, vec!["b", "a"]);
    }

    #[test]
    fn chunks_alias_becomes_contents() {
        let (registry, _, _) = normalize_one(json!({
            "name": "stratum",
            "chunks": [{"name": "a"}],
        }));
        let parent = registry.get_by_path("stratum").unwrap();
        assert_eq!(parent.contents, vec!["a"]);
        assert!(!parent.extra.contains_key("chunks"));
    }

    #[test]
    fn strata_alias_wins_over_chunks() {
        let (registry, _, _) = normalize_one(json!({
            "name": "system",
            "chunks": [{"name": "a"}],
            "strata": [{"name": "b"}],
        }));
        let parent = registry.get_by_path("system").unwrap();
        // Later-processed alias wins; the chunks list is dropped.
        assert_eq!(parent.contents, vec!["b"]);
        assert!(registry.get_by_path("a").is_none());
    }

    #[test]
    fn self_containment_warns_but_continues() {
        let (registry, _, result) = normalize_one(json!({
            "name": "busybox",
            "contents": [{"name": "busybox", "path": "inner/busybox"}],
        }));
        assert!(result.is_ok());
        assert!(registry.get_by_path("inner/busybox").is_some());
    }

    #[test]
    fn top_level_build_depends_mappings_are_inserted_and_replaced() {
        let (registry, _, _) = normalize_one(json!({
            "name": "system",
            "build-depends": [{"morph": "strata/tools.morph"}],
        }));
        assert_eq!(registry.len(), 2);
        let system = registry.get_by_path("system").unwrap();
        assert_eq!(system.build_depends, vec!["strata/tools.morph"]);
        assert!(registry.get_by_path("strata/tools.morph").is_some());
    }

    #[test]
    fn build_depends_string_entries_pass_through() {
        let (registry, _, _) = normalize_one(json!({
            "name": "system",
            "build-depends": ["strata/tools.morph"],
        }));
        assert_eq!(registry.len(), 1);
        let system = registry.get_by_path("system").unwrap();
        assert_eq!(system.build_depends, vec!["strata/tools.morph"]);
    }

    #[test]
    fn systems_are_fixed_but_not_flattened() {
        let (registry, _, _) = normalize_one(json!({
            "name": "cluster",
            "systems": [{
                "morph": "systems/devel.morph",
                "subsystems": [{"name": "sub"}],
            }],
        }));
        assert_eq!(registry.len(), 1);
        let cluster = registry.get_by_path("cluster").unwrap();
        let system = &cluster.systems[0];
        assert_eq!(system["path"], "systems/devel.morph");
        assert_eq!(system["name"], "systems-devel.morph");
        assert_eq!(system["subsystems"][0]["path"], "sub");
    }

    #[test]
    fn missing_identity_inside_systems_is_fatal() {
        let (_, _, result) = normalize_one(json!({
            "name": "cluster",
            "systems": [{"arch": "x86_64"}],
        }));
        assert!(matches!(result, Err(LoadError::MissingIdentity { .. })));
    }

    #[test]
    fn duplicate_component_across_documents_merges() {
        let mut registry = Registry::new();
        let mut session = Session::new("/work");
        Normalizer::new(&mut registry, &mut session)
            .normalize(json!({
                "name": "stratum-one",
                "contents": [{"name": "gcc", "repo": "upstream:gcc"}],
            }))
            .unwrap();
        Normalizer::new(&mut registry, &mut session)
            .normalize(json!({
                "name": "stratum-two",
                "contents": [{"name": "gcc", "build-mode": "bootstrap"}],
            }))
            .unwrap();

        let gcc = registry.get_by_path("gcc").unwrap();
        assert_eq!(gcc.extra["repo"], "upstream:gcc");
        assert_eq!(gcc.extra["build-mode"], "bootstrap");
    }
}
