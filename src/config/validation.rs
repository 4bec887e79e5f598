//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check addresses, URLs and CORS origins parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;
use url::Url;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a valid socket address")]
    InvalidBindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,

    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroRateLimit,

    #[error("security.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("cors.allowed_origins entry '{0}' is not a valid origin")]
    InvalidOrigin(String),

    #[error("sheets.sheet_name must not be empty")]
    EmptySheetName,

    #[error("sheets.timeout_secs must be greater than zero")]
    ZeroSheetsTimeout,

    #[error("sheets.{field} '{value}' is not a valid URL")]
    InvalidUrl { field: &'static str, value: String },

    #[error("sheets.timestamp_utc_offset_minutes {0} is outside -1439..=1439")]
    InvalidUtcOffset(i32),

    #[error("observability.metrics_address '{0}' is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if config.rate_limit.enabled && config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroRateLimit);
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    for origin in &config.cors.allowed_origins {
        if !is_valid_origin(origin) {
            errors.push(ValidationError::InvalidOrigin(origin.clone()));
        }
    }

    let sheets = &config.sheets;
    if sheets.sheet_name.trim().is_empty() {
        errors.push(ValidationError::EmptySheetName);
    }
    if sheets.timeout_secs == 0 {
        errors.push(ValidationError::ZeroSheetsTimeout);
    }
    for (field, value) in [("api_base", &sheets.api_base), ("token_uri", &sheets.token_uri)] {
        if Url::parse(value).is_err() {
            errors.push(ValidationError::InvalidUrl {
                field,
                value: value.clone(),
            });
        }
    }
    if sheets.timestamp_utc_offset_minutes.abs() >= 24 * 60 {
        errors.push(ValidationError::InvalidUtcOffset(
            sheets.timestamp_utc_offset_minutes,
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `*`, or a scheme + host (+ port) with no path.
fn is_valid_origin(origin: &str) -> bool {
    if origin == "*" {
        return true;
    }
    if HeaderValue::from_str(origin).is_err() {
        return false;
    }
    match Url::parse(origin) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host().is_some()
                && url.path() == "/"
                && !origin.ends_with('/')
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        config.timeouts.request_secs = 0;
        config.rate_limit.max_requests = 0;
        config.sheets.sheet_name = "  ".to_string();
        config.sheets.api_base = "::".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.contains(&ValidationError::ZeroRateLimit));
        assert!(errors.contains(&ValidationError::EmptySheetName));
    }

    #[test]
    fn test_zero_rate_limit_allowed_when_disabled() {
        let mut config = AppConfig::default();
        config.rate_limit.enabled = false;
        config.rate_limit.max_requests = 0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_origins() {
        assert!(is_valid_origin("*"));
        assert!(is_valid_origin("https://example.github.io"));
        assert!(is_valid_origin("http://127.0.0.1:5500"));
        assert!(!is_valid_origin("https://example.github.io/app/"));
        assert!(!is_valid_origin("https://example.github.io/"));
        assert!(!is_valid_origin("example.com"));
        assert!(!is_valid_origin("ftp://example.com"));
    }

    #[test]
    fn test_error_display() {
        let err = ValidationError::InvalidUrl {
            field: "api_base",
            value: "::".to_string(),
        };
        assert_eq!(err.to_string(), "sheets.api_base '::' is not a valid URL");
    }
}
