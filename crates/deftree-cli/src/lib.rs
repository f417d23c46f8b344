//! # deftree-cli — CLI Tool for deftree
//!
//! Provides the `deftree` command-line interface over the loader library.
//!
//! ## Subcommands
//!
//! - `deftree load` — Load the definition tree and report a summary.
//! - `deftree show` — Print one canonical record as YAML.
//! - `deftree trees` — Check or persist the tree-change cache.

pub mod load;
pub mod show;
pub mod trees;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use deftree_core::Session;

/// Session configuration shared by every subcommand.
#[derive(Args, Debug)]
pub struct SessionOpts {
    /// Root directory to scan for definition files (defaults to the
    /// current directory).
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Definitions directory fingerprinted by the tree cache (defaults to
    /// the scan root).
    #[arg(long, value_name = "DIR")]
    pub defdir: Option<PathBuf>,

    /// Path to the meta-schema document.
    #[arg(long, value_name = "FILE")]
    pub json_schema: Option<PathBuf>,

    /// Path to the definitions-schema document.
    #[arg(long, value_name = "FILE")]
    pub defs_schema: Option<PathBuf>,
}

impl SessionOpts {
    /// Build a `Session` from these options, defaulting the scan root to
    /// the current directory.
    pub fn build(&self) -> Result<Session> {
        let root = match &self.dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir().context("cannot determine working directory")?,
        };
        let mut session = Session::new(root);
        if let Some(defdir) = &self.defdir {
            session.defdir = defdir.clone();
        }
        if let Some(json_schema) = &self.json_schema {
            session.json_schema = json_schema.clone();
        }
        if let Some(defs_schema) = &self.defs_schema {
            session.defs_schema = defs_schema.clone();
        }
        Ok(session)
    }
}
