//! # Check Subcommand
//!
//! Loads the register registry and every schema document exactly as the
//! gateway does at startup, so configuration mistakes surface before deploy.

use std::path::Path;

use anyhow::Result;
use clap::Args;

/// Arguments for the `llc check` subcommand.
#[derive(Args, Debug, Default)]
pub struct CheckArgs {
    /// List each register with its primary id and subtypes.
    #[arg(long)]
    pub list: bool,
}

/// Execute the check subcommand.
///
/// Returns exit code 0 when the configuration loads. Load failures are
/// returned as errors.
pub fn run_check(args: &CheckArgs, repo_root: &Path) -> Result<u8> {
    let (registry, schemas) = crate::load_configuration(repo_root)?;

    println!(
        "OK: {} register(s), {} schema file(s)",
        registry.len(),
        schemas.file_count()
    );

    if args.list {
        for def in registry.iter() {
            let subtypes: Vec<&str> = def.subtypes.keys().map(|t| t.as_str()).collect();
            if subtypes.is_empty() {
                println!("  {} (primary id '{}')", def.name, def.primary_id);
            } else {
                println!(
                    "  {} (primary id '{}', subtypes {})",
                    def.name,
                    def.primary_id,
                    subtypes.join(", ")
                );
            }
        }
    }

    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_repo_root;

    #[test]
    fn repository_configuration_loads() {
        let code = run_check(&CheckArgs { list: true }, &test_repo_root()).unwrap();
        assert_eq!(code, 0);
    }

    #[test]
    fn missing_configuration_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_check(&CheckArgs::default(), dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("registers.yaml"), "{err:#}");
    }
}
