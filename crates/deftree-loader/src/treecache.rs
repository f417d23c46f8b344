//! The tree-change cache.
//!
//! Schema validation is by far the most expensive step of a load, and it
//! only matters when something under the definitions directory actually
//! changed. The cache fingerprints the directory's metadata listing (names,
//! permission modes, sizes — never file contents), persists resolved `tree`
//! values keyed by component path alongside the fingerprint, and lets the
//! loader skip validation and reuse trees when the fingerprint still
//! matches.
//!
//! This is a cost-saving heuristic, never a correctness gate: even with a
//! stale or missing cache the loader re-derives every component from
//! scratch.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use deftree_core::Registry;

use crate::error::LoadResult;

/// Name of the persisted cache file inside the definitions directory.
pub const TREES_FILE: &str = ".trees";

/// Reserved cache entry holding the directory-listing fingerprint.
const CHECKSUM_KEY: &str = ".checksum";

/// Persisted mapping from component path → resolved tree value, guarded by
/// a fingerprint of the definitions directory.
#[derive(Debug)]
pub struct TreeCache {
    defdir: PathBuf,
    trees: BTreeMap<String, String>,
}

impl TreeCache {
    /// Create an empty cache for the given definitions directory.
    pub fn new(defdir: impl Into<PathBuf>) -> Self {
        Self {
            defdir: defdir.into(),
            trees: BTreeMap::new(),
        }
    }

    /// The definitions directory this cache fingerprints.
    pub fn defdir(&self) -> &Path {
        &self.defdir
    }

    /// Look up the cached tree value for a component path.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.trees.get(path).map(String::as_str)
    }

    /// Check whether the persisted cache is still current.
    ///
    /// Returns true when the cache file exists, parses, and carries a
    /// checksum matching the live fingerprint — the cache is then loaded
    /// into memory. On any failure (absent, unreadable, unparsable,
    /// mismatched) the stale file is deleted if present, the in-memory
    /// cache is reset to empty, and the result is false.
    pub fn check(&mut self) -> bool {
        match self.try_check() {
            Ok(true) => true,
            Ok(false) => {
                self.discard();
                false
            }
            Err(err) => {
                tracing::debug!(defdir = %self.defdir.display(), error = %err, "tree cache unusable");
                self.discard();
                false
            }
        }
    }

    fn try_check(&mut self) -> LoadResult<bool> {
        let checksum = self.fingerprint()?;
        let text = std::fs::read_to_string(self.defdir.join(TREES_FILE))?;
        let trees: BTreeMap<String, String> = serde_yaml::from_str(&text)?;
        if trees.get(CHECKSUM_KEY).map(String::as_str) == Some(checksum.as_str()) {
            self.trees = trees;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn discard(&mut self) {
        self.trees.clear();
        let stale = self.defdir.join(TREES_FILE);
        if stale.exists() {
            if let Err(err) = std::fs::remove_file(&stale) {
                tracing::warn!(path = %stale.display(), error = %err, "could not remove stale tree cache");
            }
        }
    }

    /// Persist a fresh cache: the current fingerprint plus every registry
    /// record carrying a `tree` value. Fully overwrites any prior file.
    /// Called explicitly by the caller once trees are populated — never
    /// implicitly at load time.
    pub fn save(&mut self, registry: &Registry) -> LoadResult<()> {
        let checksum = self.fingerprint()?;
        let mut trees = BTreeMap::new();
        trees.insert(CHECKSUM_KEY.to_string(), checksum);
        for (path, def) in registry.iter() {
            if let Some(tree) = &def.tree {
                trees.insert(path.clone(), tree.clone());
            }
        }

        let text = serde_yaml::to_string(&trees)?;
        std::fs::write(self.defdir.join(TREES_FILE), text)?;
        self.trees = trees;
        Ok(())
    }

    /// SHA-256 over the sorted recursive metadata listing of the
    /// definitions directory. The cache file itself is excluded, so saving
    /// the cache never invalidates it.
    fn fingerprint(&self) -> LoadResult<String> {
        let mut lines = Vec::new();
        listing(&self.defdir, &self.defdir, &mut lines)?;
        lines.sort();

        let mut hasher = Sha256::new();
        for line in &lines {
            hasher.update(line.as_bytes());
            hasher.update(b"\n");
        }
        let digest = hasher.finalize();
        Ok(digest.iter().map(|b| format!("{b:02x}")).collect())
    }
}

/// Collect one metadata line per directory entry, recursively.
fn listing(root: &Path, dir: &Path, acc: &mut Vec<String>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        let rel = path
            .strip_prefix(root)
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .replace('\\', "/");
        if rel == TREES_FILE {
            continue;
        }
        acc.push(format!("{:o} {} {}", mode_of(&meta), meta.len(), rel));
        if meta.is_dir() {
            listing(root, &path, acc)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn mode_of(meta: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode()
}

#[cfg(not(unix))]
fn mode_of(meta: &Metadata) -> u32 {
    if meta.permissions().readonly() {
        0o444
    } else {
        0o644
    }
}
