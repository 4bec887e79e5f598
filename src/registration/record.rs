//! Registration data types.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The four fields of a registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Status,
}

impl Field {
    /// Fields in the order they are checked and reported.
    pub const ALL: [Field; 4] = [Field::Name, Field::Email, Field::Phone, Field::Status];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Status => "status",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, untrusted form submission.
///
/// Fields hold whatever JSON value the client sent. A JSON `null` and a
/// missing key both deserialize to `None`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistrationInput {
    pub name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub status: Option<Value>,
}

impl RegistrationInput {
    /// Build an input from a URL-encoded form body. Unknown keys are ignored.
    pub fn from_form(mut fields: HashMap<String, String>) -> Self {
        let mut take = |field: Field| fields.remove(field.as_str()).map(Value::String);
        Self {
            name: take(Field::Name),
            email: take(Field::Email),
            phone: take(Field::Phone),
            status: take(Field::Status),
        }
    }

    pub fn get(&self, field: Field) -> Option<&Value> {
        self.slot(field).as_ref()
    }

    fn slot(&self, field: Field) -> &Option<Value> {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::Phone => &self.phone,
            Field::Status => &self.status,
        }
    }

    pub(crate) fn slot_mut(&mut self, field: Field) -> &mut Option<Value> {
        match field {
            Field::Name => &mut self.name,
            Field::Email => &mut self.email,
            Field::Phone => &mut self.phone,
            Field::Status => &mut self.status,
        }
    }
}

/// Attendance type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Single,
    Couple,
}

impl Status {
    pub const OPTIONS: [&'static str; 2] = ["single", "couple"];

    /// Exact, case-sensitive parse.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "single" => Some(Status::Single),
            "couple" => Some(Status::Couple),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Single => "single",
            Status::Couple => "couple",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sanitized and validated registration.
///
/// Only [`crate::registration::pipeline`] can construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationRecord {
    name: String,
    email: String,
    phone: String,
    status: Status,
}

impl RegistrationRecord {
    pub(super) fn new(name: String, email: String, phone: String, status: Status) -> Self {
        Self {
            name,
            email,
            phone,
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Ten ASCII digits.
    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn status(&self) -> Status {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_null_and_missing_fields_are_none() {
        let input: RegistrationInput = serde_json::from_value(json!({ "name": null })).unwrap();
        assert_eq!(input, RegistrationInput::default());
    }

    #[test]
    fn test_non_string_values_are_kept() {
        let input: RegistrationInput =
            serde_json::from_value(json!({ "phone": 9876543210u64, "status": true })).unwrap();
        assert_eq!(input.get(Field::Phone), Some(&json!(9876543210u64)));
        assert_eq!(input.get(Field::Status), Some(&json!(true)));
    }

    #[test]
    fn test_from_form() {
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "Jane Doe".to_string());
        fields.insert("status".to_string(), "single".to_string());
        fields.insert("extra".to_string(), "ignored".to_string());

        let input = RegistrationInput::from_form(fields);
        assert_eq!(input.get(Field::Name), Some(&json!("Jane Doe")));
        assert_eq!(input.get(Field::Status), Some(&json!("single")));
        assert!(input.get(Field::Email).is_none());
    }

    #[test]
    fn test_status_parse_is_case_sensitive() {
        assert_eq!(Status::parse("single"), Some(Status::Single));
        assert_eq!(Status::parse("couple"), Some(Status::Couple));
        assert_eq!(Status::parse("Single"), None);
        assert_eq!(Status::Couple.to_string(), "couple");
    }
}
