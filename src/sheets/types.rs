//! Sheet writer interface, result types and error classification.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::registration::RegistrationRecord;

/// Column headers of the registration sheet (A–F).
pub const HEADER_ROW: [&str; 6] = ["Timestamp", "Name", "Email", "Phone", "Status", "Payment Status"];

/// Payment status written for every new registration.
pub const PAYMENT_PENDING: &str = "Pending";

/// Metadata about a completed append.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetAppendResult {
    pub rows_updated: u32,
    pub range: String,
}

/// Spreadsheet identity returned by a connection test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetInfo {
    pub sheet_title: String,
    pub sheet_id: String,
}

/// Outcome of header setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderSetup {
    pub created: bool,
    pub message: String,
}

impl HeaderSetup {
    pub fn created() -> Self {
        Self {
            created: true,
            message: "Headers created".to_string(),
        }
    }

    pub fn existing() -> Self {
        Self {
            created: false,
            message: "Headers already exist".to_string(),
        }
    }
}

/// Errors returned by a [`SheetWriter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SheetError {
    /// The sheet/tab name does not resolve to a range.
    #[error("Invalid sheet range: {0}")]
    InvalidRange(String),

    /// The spreadsheet does not exist.
    #[error("Sheet not found: {0}")]
    NotFound(String),

    /// The service account has no access to the spreadsheet.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Google API quota exhausted.
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Google API call exceeded the configured timeout.
    #[error("Sheets API request timed out after {0} seconds")]
    Timeout(u64),

    /// Required settings are missing or malformed.
    #[error("Sheets client misconfigured: {0}")]
    Configuration(String),

    /// Token exchange or signing failed.
    #[error("Service account authentication failed: {0}")]
    Auth(String),

    /// Anything else.
    #[error("Sheets API error: {0}")]
    Unknown(String),
}

impl SheetError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            SheetError::InvalidRange(_) => "invalid_range",
            SheetError::NotFound(_) => "not_found",
            SheetError::PermissionDenied(_) => "permission_denied",
            SheetError::QuotaExceeded(_) => "quota_exceeded",
            SheetError::Timeout(_) => "timeout",
            SheetError::Configuration(_) => "configuration",
            SheetError::Auth(_) => "auth",
            SheetError::Unknown(_) => "unknown",
        }
    }

    /// Classify a Google API error from its HTTP status and the `error.status`
    /// field of the error envelope.
    pub fn from_api_error(status: StatusCode, api_status: Option<&str>, message: String) -> Self {
        match (status, api_status) {
            (StatusCode::TOO_MANY_REQUESTS, _) | (_, Some("RESOURCE_EXHAUSTED")) => {
                SheetError::QuotaExceeded(message)
            }
            (StatusCode::FORBIDDEN, _) | (_, Some("PERMISSION_DENIED")) => {
                SheetError::PermissionDenied(message)
            }
            (StatusCode::NOT_FOUND, _) | (_, Some("NOT_FOUND")) => SheetError::NotFound(message),
            (StatusCode::UNAUTHORIZED, _) | (_, Some("UNAUTHENTICATED")) => SheetError::Auth(message),
            (StatusCode::BAD_REQUEST, _) if message.contains("Unable to parse range") => {
                SheetError::InvalidRange(message)
            }
            _ => SheetError::Unknown(format!("{status}: {message}")),
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            SheetError::Timeout(timeout_secs)
        } else {
            SheetError::Unknown(err.to_string())
        }
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ApiErrorEnvelope {
    /// Classify a non-success response body.
    pub(crate) fn classify(status: StatusCode, body: &str) -> SheetError {
        match serde_json::from_str::<ApiErrorEnvelope>(body) {
            Ok(envelope) => SheetError::from_api_error(
                status,
                envelope.error.status.as_deref(),
                envelope.error.message,
            ),
            Err(_) => {
                let message = if body.trim().is_empty() {
                    status.canonical_reason().unwrap_or("no response body").to_string()
                } else {
                    body.trim().to_string()
                };
                SheetError::from_api_error(status, None, message)
            }
        }
    }
}

/// Destination for validated registrations.
#[async_trait]
pub trait SheetWriter: Send + Sync {
    /// Append one row for `record`, stamped with `submitted_at`.
    async fn append_record(
        &self,
        record: &RegistrationRecord,
        submitted_at: DateTime<Utc>,
    ) -> Result<SheetAppendResult, SheetError>;

    /// Confirm the spreadsheet is reachable.
    async fn test_connection(&self) -> Result<SheetInfo, SheetError>;

    /// Write the header row if the sheet has none.
    async fn ensure_headers(&self) -> Result<HeaderSetup, SheetError>;
}
