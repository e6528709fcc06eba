//! # llc-schema: Schema Composition and Structural Validation
//!
//! Each register stores its record shape as a Draft 4 JSON Schema document
//! under `schemas/`. This crate loads those documents, builds the schema for
//! a specific operation, and validates payloads against it.
//!
//! - [`SchemaStore`] loads documents once and hands out per-call copies,
//!   mutated for create, update, or search and merged with a compensation
//!   subtype when one applies.
//! - [`validate()`] runs the validator and produces [`FieldError`]s with
//!   stable, readable messages.
//! - [`format_problems`] renders a message list as numbered problems.

pub mod error;
pub mod format;
pub mod store;
pub mod validate;

pub use error::SchemaError;
pub use format::{format_problems, render_all};
pub use store::SchemaStore;
pub use validate::{validate, FieldError, BLANK_MESSAGE, CURIE_MESSAGE};
