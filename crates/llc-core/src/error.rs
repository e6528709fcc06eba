//! # Error Types
//!
//! Leaf error enums shared across the workspace. Each crate above this one
//! wraps these in its own error type rather than stringifying them.

use thiserror::Error;

/// A curie string could not be turned into a `(register, id)` pair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurieError {
    /// No `:` separator, or nothing after it.
    #[error("Malformed curie '{0}', expected 'register:id'")]
    Malformed(String),

    /// The register segment names no known register.
    #[error("Invalid register name '{0}'")]
    InvalidRegisterReference(String),
}

/// Failure fetching a record from the backend store.
///
/// A missing record is not an error; sources return `Ok(None)` for that.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Transport failure: connection refused, timeout, unreadable body.
    #[error("register store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with an unexpected status.
    #[error("register store returned {status}: {body}")]
    Backend { status: u16, body: String },
}

/// The register registry could not be built.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Registry file could not be read.
    #[error("cannot read register registry {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Registry file is not valid YAML for the expected shape.
    #[error("invalid register registry: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// No registers defined at all.
    #[error("register registry defines no registers")]
    Empty,

    /// Two entries share a register name.
    #[error("register '{0}' is defined more than once")]
    DuplicateRegister(String),

    /// A register has a blank primary id field.
    #[error("register '{0}' has an empty primary id field")]
    EmptyPrimaryId(String),

    /// Geometry search enabled without a search definition to validate against.
    #[error("register '{0}' enables geometry search but names no search definition")]
    MissingSearchDefinition(String),

    /// A register lists the instrument-or-provisions validator while its
    /// compensation subtypes already perform that check.
    #[error("register '{register}' lists validator '{validator}' which its subtypes already cover")]
    RedundantValidator { register: String, validator: String },
}

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}
