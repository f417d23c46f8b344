//! # deftree CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use deftree_cli::load::{run_load, LoadArgs};
use deftree_cli::show::{run_show, ShowArgs};
use deftree_cli::trees::{run_trees, TreesArgs};

/// deftree — declarative build-definition loader.
///
/// Loads a tree of definition files, validates them against a configured
/// schema pair, normalizes authoring shorthand into canonical records, and
/// maintains a change-detection cache so unchanged trees skip validation.
#[derive(Parser, Debug)]
#[command(name = "deftree", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load the definition tree and report a summary.
    Load(LoadArgs),

    /// Load the tree and print one canonical record as YAML.
    Show(ShowArgs),

    /// Check or persist the tree-change cache.
    Trees(TreesArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Load(args) => run_load(&args),
        Commands::Show(args) => run_show(&args),
        Commands::Trees(args) => run_trees(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}
