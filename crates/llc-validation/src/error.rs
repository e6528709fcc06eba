//! Validation error types.
//!
//! Client-facing validation problems are plain strings collected into a
//! list. The types here are for the failures that abort a validation pass.

use llc_core::{CurieError, SourceError};
use llc_schema::SchemaError;
use thiserror::Error;

/// Failure to resolve one curie.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The curie string itself is bad. Reported to the client.
    #[error(transparent)]
    Curie(#[from] CurieError),
    /// The register store could not answer. Fatal.
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// A failure that aborts the validation pass and becomes a 500.
#[derive(Error, Debug)]
pub enum Fault {
    #[error("register store lookup failed: {0}")]
    Source(#[from] SourceError),
    #[error("schema failure: {0}")]
    Schema(#[from] SchemaError),
}
