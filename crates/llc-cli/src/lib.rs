//! # llc-cli: CLI Tool for the LLC Register Gateway
//!
//! Provides the `llc` command-line interface for working with register
//! configuration without running the gateway or a register store.
//!
//! ## Subcommands
//!
//! - `llc validate`: Structural validation of a record file.
//! - `llc check`: Load the registry and every schema, report a summary.
//!
//! ```bash
//! llc validate charge.json --register local-land-charge
//! llc validate charge.json --register local-land-charge --update 48
//! llc check
//! ```

pub mod check;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use llc_core::RegisterRegistry;
use llc_schema::SchemaStore;

/// Resolve a path that may be relative to the repository root.
///
/// Absolute paths are returned as-is. A relative path that exists under
/// `repo_root` resolves there; otherwise it is left relative to the
/// current directory.
pub fn resolve_path(path: &Path, repo_root: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let repo_relative = repo_root.join(path);
    if repo_relative.exists() {
        repo_relative
    } else {
        path.to_path_buf()
    }
}

/// Load `config/registers.yaml` and `schemas/` under `repo_root`.
pub(crate) fn load_configuration(repo_root: &Path) -> Result<(RegisterRegistry, SchemaStore)> {
    let registry_path = repo_root.join("config").join("registers.yaml");
    let registry = RegisterRegistry::load(&registry_path)
        .with_context(|| format!("failed to load {}", registry_path.display()))?;
    let schemas = SchemaStore::load(repo_root.join("schemas"), &registry)
        .context("failed to load register schemas")?;
    Ok((registry, schemas))
}

#[cfg(test)]
pub(crate) fn test_repo_root() -> PathBuf {
    let mut dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    dir.pop(); // crates
    dir.pop(); // repo root
    dir
}
