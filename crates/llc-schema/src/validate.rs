//! # Structural Validation
//!
//! Runs Draft 4 JSON Schema validation over a payload and turns each raw
//! error into a [`FieldError`]: a field path plus a short message.
//!
//! ## Message Rules
//!
//! Messages are built from the structured error kind, not from library
//! wording. Pattern failures get three rewrites, applied in order:
//!
//! 1. pattern `\S+` becomes `must not be blank`;
//! 2. pattern `\S+:\S+` becomes the curie hint;
//! 3. on the primary-id field, the `^…$` anchors of the pinned id are dropped
//!    so the message reads `'2' does not match '1'`.
//!
//! ## Ordering
//!
//! Errors are sorted by their rendered text. The same payload against the
//! same schema always yields the same list.

use std::fmt;

use jsonschema::error::ValidationErrorKind;
use jsonschema::{ValidationError, Validator};
use serde_json::Value;

use crate::error::SchemaError;

/// Pattern the schemas use for "must contain a non-space character".
pub const NON_BLANK_PATTERN: &str = r"\S+";

/// Pattern the schemas use for curie-typed fields.
pub const CURIE_PATTERN: &str = r"\S+:\S+";

pub const BLANK_MESSAGE: &str = "must not be blank";

pub const CURIE_MESSAGE: &str = "must be specified as a Curie e.g. statutory-provision:1234";

/// One structural problem with a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Path segments into the payload; empty for document-level errors.
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }

    /// Dotted field path, or `None` at document level.
    pub fn field(&self) -> Option<String> {
        if self.path.is_empty() {
            None
        } else {
            Some(self.path.join("."))
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field() {
            Some(field) => write!(f, "'{field}' {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Compile a schema under Draft 4 rules.
pub(crate) fn compile(schema: &Value) -> Result<Validator, SchemaError> {
    let mut opts = jsonschema::options();
    opts.with_draft(jsonschema::Draft::Draft4);
    opts.build(schema)
        .map_err(|e| SchemaError::InvalidSchema(e.to_string()))
}

/// Validate `payload` against `schema`, returning errors in stable order.
///
/// `primary_id` names the register's primary-id field so that the pinned-id
/// pattern can be reported readably.
pub fn validate(
    schema: &Value,
    payload: &Value,
    primary_id: &str,
) -> Result<Vec<FieldError>, SchemaError> {
    let validator = compile(schema)?;
    let mut errors: Vec<FieldError> = validator
        .iter_errors(payload)
        .map(|e| describe(&e, primary_id))
        .collect();
    errors.sort_by_cached_key(|e| e.to_string());
    Ok(errors)
}

fn describe(error: &ValidationError<'_>, primary_id: &str) -> FieldError {
    let mut path = pointer_segments(&error.instance_path.to_string());

    let message = match &error.kind {
        ValidationErrorKind::Required { property } => {
            path.push(
                property
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| property.to_string()),
            );
            "is a required property".to_string()
        }
        ValidationErrorKind::AdditionalProperties { unexpected } => {
            additional_properties_message(unexpected)
        }
        ValidationErrorKind::Pattern { pattern } => {
            let on_primary_id = path.len() == 1 && path[0] == primary_id;
            pattern_message(&error.instance, pattern, on_primary_id)
        }
        ValidationErrorKind::Type { .. } => {
            let text = error.to_string();
            match text.find("is not of type") {
                Some(at) => text[at..].to_string(),
                None => text,
            }
        }
        _ => error.to_string(),
    };

    FieldError::new(path, message)
}

fn pattern_message(instance: &Value, pattern: &str, on_primary_id: bool) -> String {
    match pattern {
        NON_BLANK_PATTERN => BLANK_MESSAGE.to_string(),
        CURIE_PATTERN => CURIE_MESSAGE.to_string(),
        _ if on_primary_id => format!(
            "'{}' does not match '{}'",
            display_value(instance),
            unanchor(pattern)
        ),
        _ => format!("'{}' does not match '{}'", display_value(instance), pattern),
    }
}

fn additional_properties_message(unexpected: &[String]) -> String {
    let quoted: Vec<String> = unexpected.iter().map(|p| format!("'{p}'")).collect();
    let verb = if quoted.len() == 1 { "was" } else { "were" };
    format!(
        "Additional properties are not allowed ({} {verb} unexpected)",
        quoted.join(", ")
    )
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Drop one leading `^` and one trailing `$`, then undo regex escaping.
fn unanchor(pattern: &str) -> String {
    let inner = pattern.strip_prefix('^').unwrap_or(pattern);
    let inner = inner.strip_suffix('$').unwrap_or(inner);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Split a JSON pointer (`/a/0/b`) into unescaped segments.
fn pointer_segments(pointer: &str) -> Vec<String> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .split('/')
        .skip(1)
        .map(|s| s.replace("~1", "/").replace("~0", "~"))
        .collect()
}
