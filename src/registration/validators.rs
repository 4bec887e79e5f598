//! Field validators.
//!
//! Every predicate is total: any input it cannot accept yields `false`.
//! They are pure and may be called concurrently in any order.

use std::sync::LazyLock;

use regex::Regex;

use crate::registration::record::Status;

/// Minimum trimmed length of a name.
pub const MIN_NAME_LEN: usize = 2;

/// Digits in a valid phone number.
pub const PHONE_DIGITS: usize = 10;

// Loose on purpose: `a@b..c` and `a@b.c.d` both pass.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// At least two characters after trimming, ASCII letters and spaces only.
pub fn is_valid_name(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.chars().count() >= MIN_NAME_LEN
        && trimmed.chars().all(|c| c.is_ascii_alphabetic() || c == ' ')
}

/// `local@domain.tld` with no whitespace and exactly one `@`.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Keep only ASCII digits.
pub fn phone_digits(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

/// Exactly ten digits once punctuation and spacing are stripped.
pub fn is_valid_phone(phone: &str) -> bool {
    phone_digits(phone).len() == PHONE_DIGITS
}

/// `single` or `couple`, case-sensitive.
pub fn is_valid_status(status: &str) -> bool {
    Status::parse(status).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name() {
        assert!(is_valid_name("John Doe"));
        assert!(is_valid_name("  Al  "));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("   "));
        assert!(!is_valid_name("J"));
        assert!(!is_valid_name(" J "));
        assert!(!is_valid_name("John2"));
        assert!(!is_valid_name("O'Brien"));
        assert!(!is_valid_name("Jean-Luc"));
        assert!(!is_valid_name("José"));
    }

    #[test]
    fn test_email() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("jane@example.com"));
        // Known looseness.
        assert!(is_valid_email("a@b.c.d"));
        assert!(is_valid_email("a@b..c"));

        assert!(!is_valid_email("a@@b.com"));
        assert!(!is_valid_email("a@b@c.com"));
        assert!(!is_valid_email("ab.com"));
        assert!(!is_valid_email("a@bcom"));
        assert!(!is_valid_email("@b.com"));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@b.com "));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_phone() {
        assert!(is_valid_phone("987-654-3210"));
        assert!(is_valid_phone("(987) 654 3210"));
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("12345"));
        assert!(!is_valid_phone("+91 98765 43210"));
        assert!(!is_valid_phone("phone"));
        assert_eq!(phone_digits("987-654-3210"), "9876543210");
    }

    #[test]
    fn test_status() {
        assert!(is_valid_status("single"));
        assert!(is_valid_status("couple"));
        assert!(!is_valid_status("Single"));
        assert!(!is_valid_status("group"));
        assert!(!is_valid_status(""));
    }
}
