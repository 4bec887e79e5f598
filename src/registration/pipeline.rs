//! Sanitize-then-validate pipeline producing a [`RegistrationRecord`].
//!
//! Validation runs in two passes. The first reports every missing field. The
//! second, which only runs when nothing is missing, reports every format
//! violation.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::registration::record::{Field, RegistrationInput, RegistrationRecord, Status};
use crate::registration::sanitizer::sanitize_registration;
use crate::registration::validators::{
    is_valid_email, is_valid_name, is_valid_phone, is_valid_status, phone_digits,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldErrorKind {
    Missing,
    InvalidFormat,
}

/// A single violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub kind: FieldErrorKind,
}

impl FieldError {
    fn missing(field: Field) -> Self {
        Self {
            field,
            kind: FieldErrorKind::Missing,
        }
    }

    fn invalid(field: Field) -> Self {
        Self {
            field,
            kind: FieldErrorKind::InvalidFormat,
        }
    }

    /// Human-readable message returned to the client.
    pub fn message(&self) -> &'static str {
        match (self.kind, self.field) {
            (FieldErrorKind::Missing, Field::Name) => "Name is required",
            (FieldErrorKind::Missing, Field::Email) => "Email is required",
            (FieldErrorKind::Missing, Field::Phone) => "Phone number is required",
            (FieldErrorKind::Missing, Field::Status) => "Status is required",
            (FieldErrorKind::InvalidFormat, Field::Name) => {
                "Name must be at least 2 characters long and contain only letters and spaces"
            }
            (FieldErrorKind::InvalidFormat, Field::Email) => "Please provide a valid email address",
            (FieldErrorKind::InvalidFormat, Field::Phone) => "Phone number must be exactly 10 digits",
            (FieldErrorKind::InvalidFormat, Field::Status) => {
                "Status must be either \"single\" or \"couple\""
            }
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Why a submission was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    #[error("Missing required fields")]
    MissingFields(Vec<FieldError>),

    #[error("Validation failed")]
    InvalidFormat(Vec<FieldError>),
}

impl ValidationFailure {
    pub fn errors(&self) -> &[FieldError] {
        match self {
            ValidationFailure::MissingFields(errors) | ValidationFailure::InvalidFormat(errors) => {
                errors
            }
        }
    }

    pub fn details(&self) -> Vec<&'static str> {
        self.errors().iter().map(FieldError::message).collect()
    }
}

/// Sanitize the input, then validate it.
pub fn process_registration(mut input: RegistrationInput) -> Result<RegistrationRecord, ValidationFailure> {
    sanitize_registration(&mut input);
    validate_registration(&input)
}

/// Validate already-sanitized input and build the normalized record.
pub fn validate_registration(input: &RegistrationInput) -> Result<RegistrationRecord, ValidationFailure> {
    let missing: Vec<FieldError> = Field::ALL
        .into_iter()
        .filter(|field| !is_present(input.get(*field)))
        .map(FieldError::missing)
        .collect();
    if !missing.is_empty() {
        return Err(ValidationFailure::MissingFields(missing));
    }

    let text = move |field: Field| input.get(field).and_then(Value::as_str);
    let mut errors = Vec::new();

    let name = text(Field::Name).filter(|name| is_valid_name(name));
    if name.is_none() {
        errors.push(FieldError::invalid(Field::Name));
    }

    let email = text(Field::Email).filter(|email| is_valid_email(email));
    if email.is_none() {
        errors.push(FieldError::invalid(Field::Email));
    }

    let phone = text(Field::Phone).filter(|phone| is_valid_phone(phone));
    if phone.is_none() {
        errors.push(FieldError::invalid(Field::Phone));
    }

    let status = text(Field::Status)
        .filter(|status| is_valid_status(status))
        .and_then(Status::parse);
    if status.is_none() {
        errors.push(FieldError::invalid(Field::Status));
    }

    match (name, email, phone, status) {
        (Some(name), Some(email), Some(phone), Some(status)) if errors.is_empty() => {
            Ok(RegistrationRecord::new(
                name.trim().to_string(),
                email.trim().to_lowercase(),
                phone_digits(phone),
                status,
            ))
        }
        _ => Err(ValidationFailure::InvalidFormat(errors)),
    }
}

/// Absent, `null` and empty strings count as missing. Any other value is
/// present, even if it is not a string.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.is_empty(),
        Some(_) => true,
    }
}
