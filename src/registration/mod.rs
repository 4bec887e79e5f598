//! Registration input handling.
//!
//! # Data Flow
//! ```text
//! RegistrationInput (untrusted JSON / form body)
//!     → sanitizer.rs (strip markup, trim, truncate, case-fold)
//!     → validators.rs (per-field predicates)
//!     → pipeline.rs (missing-field pass, then format pass)
//!     → RegistrationRecord (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Sanitize before validating; validators assume truncated, tag-free input
//! - A `RegistrationRecord` can only be built by the pipeline
//! - Every violated rule is reported, not just the first

pub mod pipeline;
pub mod record;
pub mod sanitizer;
pub mod validators;

pub use pipeline::{process_registration, validate_registration, FieldError, FieldErrorKind, ValidationFailure};
pub use record::{Field, RegistrationInput, RegistrationRecord, Status};
pub use sanitizer::{sanitize_field, sanitize_registration, sanitize_text};
