//! # Curie References
//!
//! A curie is a compact `register-name:primary-id` string pointing at a
//! record in another (or the same) register. Only the first `:` separates
//! the two halves, so ids may themselves contain colons.

use crate::error::CurieError;
use crate::registry::RegisterRegistry;

/// A parsed curie whose register segment is known to the registry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Curie {
    register: String,
    id: String,
}

impl Curie {
    /// Parse `raw` and check its register against `registry`.
    pub fn parse(raw: &str, registry: &RegisterRegistry) -> Result<Self, CurieError> {
        let (register, id) = split(raw)?;
        if !registry.contains(register) {
            return Err(CurieError::InvalidRegisterReference(register.to_string()));
        }
        Ok(Self {
            register: register.to_string(),
            id: id.to_string(),
        })
    }

    /// Build a curie for a record known to live in `register`.
    pub fn new(register: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            register: register.into(),
            id: id.into(),
        }
    }

    pub fn register(&self) -> &str {
        &self.register
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl std::fmt::Display for Curie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.register, self.id)
    }
}

fn split(raw: &str) -> Result<(&str, &str), CurieError> {
    match raw.split_once(':') {
        Some((register, id)) if !register.is_empty() && !id.is_empty() => Ok((register, id)),
        _ => Err(CurieError::Malformed(raw.to_string())),
    }
}
