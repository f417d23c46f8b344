//! # deftree-loader — Definition-Tree Loading
//!
//! The orchestration layer of deftree. A load is one sequential pass:
//!
//! 1. The tree-change cache fingerprints the definitions directory and
//!    decides whether anything changed since the last run.
//! 2. The directory walk visits every `.def`/`.morph` file under the scan
//!    root (skipping `.git` subtrees), parsing each as YAML.
//! 3. Changed trees get each document validated against the configured
//!    schema pair, when one loaded.
//! 4. The normalizer rewrites authoring shorthand into canonical shape and
//!    flattens nested components into the registry.
//! 5. A trustworthy cache back-fills resolved `tree` values onto records.
//!
//! Everything is synchronous and single-owner: one registry per session,
//! built and consumed in a single pass, no retries, fail-fast on the two
//! fatal conditions (missing identity, schema violation).

pub mod error;
pub mod loader;
pub mod normalize;
pub mod treecache;

pub use error::{LoadError, LoadResult};
pub use loader::{Definitions, DEFINITION_EXTENSIONS};
pub use normalize::Normalizer;
pub use treecache::{TreeCache, TREES_FILE};
