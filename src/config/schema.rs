//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration for the registration service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Deployment environment name ("development", "production", ...).
    pub environment: String,

    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// Cross-origin settings.
    pub cors: CorsConfig,

    /// Security hardening.
    pub security: SecurityConfig,

    /// Google Sheets integration.
    pub sheets: SheetsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            security: SecurityConfig::default(),
            sheets: SheetsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// Production hides internal error messages from clients.
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed per inbound request, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Rate limiting configuration.
///
/// The window length is fixed at one minute.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable rate limiting on registration submissions.
    pub enabled: bool,

    /// Maximum submissions per client address per window.
    pub max_requests: u32,

    /// Key clients by the first `X-Forwarded-For` entry instead of the peer
    /// address. Only enable behind a proxy that overwrites the header.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 10,
            trust_forwarded_for: false,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allowed origins. A single "*" allows any origin.
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:5500".to_string(),
            ],
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add hardening response headers.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Google Sheets configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Spreadsheet ID (from the sheet URL).
    pub spreadsheet_id: Option<String>,

    /// Tab name rows are appended to.
    pub sheet_name: String,

    /// Google Cloud project of the service account.
    pub project_id: Option<String>,

    /// Service account email (JWT issuer).
    pub service_account_email: Option<String>,

    /// Service account private key (PEM). Literal `\n` sequences are accepted.
    pub private_key: Option<String>,

    /// Pre-issued bearer token. Takes precedence over the service account.
    pub access_token: Option<String>,

    /// OAuth token endpoint.
    pub token_uri: String,

    /// Sheets API base URL.
    pub api_base: String,

    /// Per-call timeout for Google APIs, in seconds.
    pub timeout_secs: u64,

    /// Offset applied to the row timestamp, in minutes east of UTC.
    pub timestamp_utc_offset_minutes: i32,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: "Form Responses".to_string(),
            project_id: None,
            service_account_email: None,
            private_key: None,
            access_token: None,
            token_uri: "https://oauth2.googleapis.com/token".to_string(),
            api_base: "https://sheets.googleapis.com/".to_string(),
            timeout_secs: 10,
            timestamp_utc_offset_minutes: 330, // IST
        }
    }
}

// Credentials never reach the logs.
impl fmt::Debug for SheetsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |secret: &Option<String>| secret.as_ref().map(|_| "<redacted>");
        f.debug_struct("SheetsConfig")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("sheet_name", &self.sheet_name)
            .field("project_id", &self.project_id)
            .field("service_account_email", &self.service_account_email)
            .field("private_key", &redacted(&self.private_key))
            .field("access_token", &redacted(&self.access_token))
            .field("token_uri", &self.token_uri)
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .field("timestamp_utc_offset_minutes", &self.timestamp_utc_offset_minutes)
            .finish()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Emit JSON logs. Defaults to on in production.
    pub json_logs: Option<bool>,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
