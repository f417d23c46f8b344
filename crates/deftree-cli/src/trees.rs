//! # Trees Subcommand
//!
//! Reports whether the tree-change cache is current, and optionally
//! persists a fresh cache after a load.

use anyhow::{Context, Result};
use clap::Args;

use deftree_loader::{Definitions, TREES_FILE};

use crate::SessionOpts;

/// Arguments for the `deftree trees` subcommand.
#[derive(Args, Debug)]
pub struct TreesArgs {
    /// Recompute the fingerprint and persist the cache after loading.
    #[arg(long)]
    pub save: bool,

    #[command(flatten)]
    pub session: SessionOpts,
}

/// Execute the trees subcommand.
///
/// Returns exit code: 0 when the cache is current (or was just saved),
/// 1 when it was stale and not saved.
pub fn run_trees(args: &TreesArgs) -> Result<u8> {
    let mut session = args.session.build()?;
    let mut definitions = Definitions::load(&mut session)?;

    if args.save {
        definitions
            .save_trees()
            .context("failed to write tree cache")?;
        println!("OK: wrote {} under {}", TREES_FILE, session.defdir.display());
        return Ok(0);
    }

    if definitions.tree_cache_valid() {
        println!("OK: tree cache is current");
        Ok(0)
    } else {
        println!("STALE: tree cache was rebuilt; rerun with --save to persist it");
        Ok(1)
    }
}
