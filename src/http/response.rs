//! Response bodies and error-to-status mapping.
//!
//! Every failure renders as `{"success": false, "error": ...}` plus
//! variant-specific fields. Internal messages are only included when the
//! service is not running in production.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::registration::ValidationFailure;
use crate::sheets::SheetError;

/// Advertised on 404s.
pub const AVAILABLE_ENDPOINTS: &str =
    "GET /api/health, GET /api/register, POST /api/register, GET /api/test-sheets";

/// Errors surfaced to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Too many requests. Please try again later.")]
    RateLimited { retry_after_secs: u64 },

    #[error(transparent)]
    Validation(#[from] ValidationFailure),

    #[error("{0}")]
    BadRequest(String),

    #[error("sheet write failed: {source}")]
    Upstream { source: SheetError, expose_details: bool },

    #[error("Endpoint not found. Available endpoints: {}", AVAILABLE_ENDPOINTS)]
    NotFound,

    #[error("{message}")]
    Internal { message: String, expose_details: bool },
}

/// Client-facing code for an upstream failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PermissionError,
    SheetNotFound,
    QuotaExceeded,
    InternalError,
}

/// Status, code and public message for a sheet failure.
pub fn classify_upstream(err: &SheetError) -> (StatusCode, ErrorCode, &'static str) {
    const CONFIG_MESSAGE: &str = "Server configuration error. Please contact support.";
    const RETRY_LATER: &str = "Service temporarily unavailable. Please try again in a few minutes.";

    match err {
        SheetError::PermissionDenied(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::PermissionError,
            CONFIG_MESSAGE,
        ),
        SheetError::NotFound(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::SheetNotFound,
            CONFIG_MESSAGE,
        ),
        SheetError::QuotaExceeded(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::QuotaExceeded,
            RETRY_LATER,
        ),
        SheetError::Timeout(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::InternalError,
            RETRY_LATER,
        ),
        SheetError::InvalidRange(_)
        | SheetError::Configuration(_)
        | SheetError::Auth(_)
        | SheetError::Unknown(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError,
            "Registration failed. Please try again later.",
        ),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ErrorBody {
    fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            code: None,
            details: None,
            retry_after: None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::RateLimited { retry_after_secs } => {
                let body = ErrorBody {
                    retry_after: Some(retry_after_secs),
                    ..ErrorBody::new(self.to_string())
                };
                let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
            ApiError::Validation(failure) => {
                let body = ErrorBody {
                    details: Some(serde_json::json!(failure.details())),
                    ..ErrorBody::new(failure.to_string())
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorBody::new(message))).into_response()
            }
            ApiError::Upstream {
                source,
                expose_details,
            } => {
                let (status, code, message) = classify_upstream(&source);
                let body = ErrorBody {
                    code: Some(code),
                    details: expose_details.then(|| source.to_string().into()),
                    ..ErrorBody::new(message)
                };
                (status, Json(body)).into_response()
            }
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(ErrorBody::new(self.to_string()))).into_response()
            }
            ApiError::Internal {
                message,
                expose_details,
            } => {
                let error = if expose_details {
                    message
                } else {
                    "Internal server error".to_string()
                };
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(error))).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::{process_registration, RegistrationInput};
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn render(err: ApiError) -> (StatusCode, Value, Response) {
        let response = err.into_response();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap();
        (status, json, Response::from_parts(parts, axum::body::Body::empty()))
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let (status, body, response) = render(ApiError::RateLimited { retry_after_secs: 42 }).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["success"], false);
        assert_eq!(body["retryAfter"], 42);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
    }

    #[tokio::test]
    async fn test_validation() {
        let failure = process_registration(RegistrationInput::default()).unwrap_err();
        let (status, body, _) = render(failure.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields");
        assert_eq!(body["details"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_upstream_mapping() {
        let cases = [
            (SheetError::PermissionDenied("x".into()), 500, "PERMISSION_ERROR"),
            (SheetError::NotFound("x".into()), 500, "SHEET_NOT_FOUND"),
            (SheetError::QuotaExceeded("x".into()), 503, "QUOTA_EXCEEDED"),
            (SheetError::Timeout(10), 503, "INTERNAL_ERROR"),
            (SheetError::InvalidRange("x".into()), 500, "INTERNAL_ERROR"),
            (SheetError::Unknown("x".into()), 500, "INTERNAL_ERROR"),
        ];

        for (source, status, code) in cases {
            let (actual, body, _) = render(ApiError::Upstream {
                source,
                expose_details: false,
            })
            .await;
            assert_eq!(actual.as_u16(), status);
            assert_eq!(body["code"], code);
            assert!(body.get("details").is_none());
        }
    }

    #[tokio::test]
    async fn test_upstream_details_outside_production() {
        let (_, body, _) = render(ApiError::Upstream {
            source: SheetError::NotFound("Requested entity was not found.".into()),
            expose_details: true,
        })
        .await;
        assert_eq!(body["details"], "Sheet not found: Requested entity was not found.");
    }

    #[tokio::test]
    async fn test_internal_hides_message_in_production() {
        let (_, body, _) = render(ApiError::Internal {
            message: "boom".into(),
            expose_details: false,
        })
        .await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn test_not_found() {
        let (status, body, _) = render(ApiError::NotFound).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("POST /api/register"));
    }
}
