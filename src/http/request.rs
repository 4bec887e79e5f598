//! Request handling.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4)
//! - Decode registration bodies sent as JSON or URL-encoded forms
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Malformed JSON or form bodies become JSON 400s, never plain-text rejections
//! - Other content types are not parsed; the pipeline then reports every field as missing

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderName, HeaderValue},
    Form, Json,
};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::ApiError;
use crate::registration::RegistrationInput;

/// Header carrying the request ID.
pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Assigns a random UUID to requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Registration body in either JSON or `application/x-www-form-urlencoded`.
#[derive(Debug)]
pub struct RegistrationPayload(pub RegistrationInput);

impl<S> FromRequest<S> for RegistrationPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim().to_ascii_lowercase());

        match content_type.as_deref().map(BodyKind::of) {
            Some(BodyKind::Form) => {
                let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state)
                    .await
                    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
                Ok(Self(RegistrationInput::from_form(fields)))
            }
            Some(BodyKind::Json) => {
                let Json(input) = Json::<RegistrationInput>::from_request(req, state)
                    .await
                    .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
                Ok(Self(input))
            }
            // Unparsed bodies leave every field unset.
            Some(BodyKind::Other) | None => Ok(Self(RegistrationInput::default())),
        }
    }
}

enum BodyKind {
    Json,
    Form,
    Other,
}

impl BodyKind {
    fn of(content_type: &str) -> Self {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        if mime == "application/x-www-form-urlencoded" {
            BodyKind::Form
        } else if mime == "application/json" || mime.ends_with("+json") {
            BodyKind::Json
        } else {
            BodyKind::Other
        }
    }
}
