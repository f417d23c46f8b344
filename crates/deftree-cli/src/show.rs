//! # Show Subcommand
//!
//! Loads the tree and prints one canonical record as YAML.

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use deftree_loader::Definitions;

use crate::SessionOpts;

/// Arguments for the `deftree show` subcommand.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Path identifier of the record to print.
    #[arg(value_name = "PATH")]
    pub path: String,

    #[command(flatten)]
    pub session: SessionOpts,
}

/// Execute the show subcommand.
///
/// Returns exit code: 0 on success, 1 when the path is not registered.
pub fn run_show(args: &ShowArgs) -> Result<u8> {
    let mut session = args.session.build()?;
    let definitions = Definitions::load(&mut session)?;

    match definitions.get_by_path(&args.path) {
        Some(def) => {
            let text = serde_yaml::to_string(&Value::Object(def.to_map()))?;
            print!("{text}");
            Ok(0)
        }
        None => {
            println!("not found: {}", args.path);
            Ok(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn opts(dir: PathBuf) -> SessionOpts {
        SessionOpts {
            dir: Some(dir),
            defdir: None,
            json_schema: None,
            defs_schema: None,
        }
    }

    #[test]
    fn run_show_unknown_path_returns_1() {
        let dir = tempfile::tempdir().unwrap();
        let args = ShowArgs {
            path: "no/such/path".to_string(),
            session: opts(dir.path().to_path_buf()),
        };
        assert_eq!(run_show(&args).unwrap(), 1);
    }

    #[test]
    fn run_show_known_path_returns_0() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("core.def"), "name: core\n").unwrap();

        let args = ShowArgs {
            path: "core.def".to_string(),
            session: opts(dir.path().to_path_buf()),
        };
        assert_eq!(run_show(&args).unwrap(), 0);
    }
}
