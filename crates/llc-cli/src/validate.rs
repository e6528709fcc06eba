//! # Validate Subcommand
//!
//! Offline structural validation of a record file against a register's
//! composed schema. Semantic checks that need the register store (curie
//! resolution, compensation classification, archive rules) are not run.
//!
//! Problems are printed numbered:
//!
//! ```text
//! Problem 1:
//!
//! 'charge-type' is a required property
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use llc_core::Operation;
use llc_schema::{format_problems, render_all, validate};
use serde_json::Value;

/// Arguments for the `llc validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// JSON record file to validate.
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Register the record belongs to.
    #[arg(long)]
    pub register: String,

    /// Validate as an update of the record with this primary id.
    #[arg(long, value_name = "ID")]
    pub update: Option<String>,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 when the record is valid, 1 when it has problems.
pub fn run_validate(args: &ValidateArgs, repo_root: &Path) -> Result<u8> {
    let (registry, schemas) = crate::load_configuration(repo_root)?;
    let def = registry
        .get(&args.register)
        .with_context(|| format!("unknown register '{}'", args.register))?;

    let path = crate::resolve_path(&args.path, repo_root);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut record: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;

    def.drop_placeholders(&mut record);

    let operation = if args.update.is_some() {
        Operation::Update
    } else {
        Operation::Create
    };
    let mut schema = schemas.build_schema(&def.name, operation, args.update.as_deref(), None)?;
    schemas.apply_conditional_required(&def.name, &mut schema, &record)?;
    let errors = render_all(&validate(&schema, &record, &def.primary_id)?);

    tracing::debug!(register = %def.name, problems = errors.len(), "validated record");

    if errors.is_empty() {
        println!("OK: {} is a valid '{}' record", path.display(), def.name);
        Ok(0)
    } else {
        print!("{}", format_problems(&errors));
        Ok(1)
    }
}
