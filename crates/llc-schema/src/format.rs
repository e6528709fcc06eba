//! Rendering of validation errors for humans.

use crate::validate::FieldError;

/// Render each error as `'field' message` (or the bare message).
pub fn render_all(errors: &[FieldError]) -> Vec<String> {
    errors.iter().map(ToString::to_string).collect()
}

/// Number each message as a problem block:
///
/// ```text
/// Problem 1:
///
/// 'charge-type' is a required property
///
/// ```
pub fn format_problems(messages: &[String]) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(i, msg)| format!("Problem {}:\n\n{msg}\n\n", i + 1))
        .collect()
}
