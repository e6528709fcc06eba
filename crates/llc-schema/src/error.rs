//! Schema loading and composition errors.

use llc_core::SubtypeTag;
use thiserror::Error;

/// Error loading, composing or compiling a register schema.
///
/// Everything except [`SchemaError::UnknownRegister`] and
/// [`SchemaError::MissingPrimaryId`] indicates broken configuration and is
/// caught at startup.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// The schema file could not be read.
    #[error("cannot read schema {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// The schema file is not valid JSON.
    #[error("schema {file} is not valid JSON: {reason}")]
    Parse { file: String, reason: String },

    /// The schema document has no `definitions` object.
    #[error("schema {file} has no 'definitions' object")]
    MissingDefinitions { file: String },

    /// A definition the registry refers to is absent from the document.
    #[error("register '{register}' refers to missing definition '{definition}'")]
    MissingDefinition { register: String, definition: String },

    /// A subtype redefines a property of the base record.
    #[error("register '{register}': subtype '{subtype}' redefines base property '{property}'")]
    DuplicateProperty {
        register: String,
        subtype: SubtypeTag,
        property: String,
    },

    /// The composed schema failed to compile.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// Caller asked for a register the store does not know.
    #[error("unknown register '{0}'")]
    UnknownRegister(String),

    /// Search requested on a register without a search definition.
    #[error("register '{0}' has no search definition")]
    NoSearchDefinition(String),

    /// Subtype requested on a register that does not define it.
    #[error("register '{register}' has no subtype '{subtype}'")]
    UnknownSubtype {
        register: String,
        subtype: SubtypeTag,
    },

    /// Update schemas pin the primary id; one must be supplied.
    #[error("update schema for register '{0}' needs a primary id")]
    MissingPrimaryId(String),
}
