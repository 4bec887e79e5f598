//! Input sanitization.
//!
//! Strips `<` and `>` to blunt naive markup injection. This is not an XSS
//! sanitizer; output encoding remains the consumer's job.

use serde_json::Value;

use crate::registration::record::{Field, RegistrationInput};

/// Maximum characters kept per field.
pub const MAX_FIELD_LEN: usize = 200;

/// Remove angle brackets, trim, and cap at [`MAX_FIELD_LEN`] characters.
///
/// Idempotent: whitespace exposed by removing brackets or by truncation is
/// trimmed as well.
pub fn sanitize_text(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| !matches!(c, '<' | '>')).collect();
    let truncated: String = stripped.trim().chars().take(MAX_FIELD_LEN).collect();
    truncated.trim_end().to_string()
}

/// Sanitize a string value; anything else passes through unchanged.
pub fn sanitize_field(value: Value) -> Value {
    match value {
        Value::String(text) => Value::String(sanitize_text(&text)),
        other => other,
    }
}

/// Sanitize every present field in place, then case-fold `email` and `status`.
pub fn sanitize_registration(input: &mut RegistrationInput) {
    for field in Field::ALL {
        let slot = input.slot_mut(field);
        let Some(value) = slot.take() else {
            continue;
        };

        let mut value = sanitize_field(value);
        if matches!(field, Field::Email | Field::Status) {
            if let Value::String(text) = &mut value {
                *text = text.to_lowercase();
            }
        }
        *slot = Some(value);
    }
}
