//! Route handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};

use crate::http::request::RegistrationPayload;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::registration::{process_registration, Field, Status};

const TROUBLESHOOTING: [&str; 4] = [
    "1. Verify GOOGLE_SHEET_ID in .env file",
    "2. Ensure service account has access to the sheet",
    "3. Check that all Google credentials are correct",
    "4. Make sure Google Sheets API is enabled in Google Cloud Console",
];

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `GET /api/health`
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Event registration backend is running!",
        "timestamp": now_iso(),
        "environment": state.config.environment,
    }))
}

/// `GET /api/register`: describes the submission format.
pub async fn register_info() -> Json<Value> {
    let required: Vec<&str> = Field::ALL.iter().map(Field::as_str).collect();
    Json(json!({
        "message": "Event Registration API",
        "method": "POST",
        "endpoint": "/api/register",
        "requiredFields": required,
        "statusOptions": Status::OPTIONS,
        "example": {
            "name": "John Doe",
            "email": "john@example.com",
            "phone": "9876543210",
            "status": "single",
        },
    }))
}

/// `POST /api/register`: validate, then append to the sheet.
pub async fn register(
    State(state): State<AppState>,
    RegistrationPayload(input): RegistrationPayload,
) -> Result<Json<Value>, ApiError> {
    let record = match process_registration(input) {
        Ok(record) => record,
        Err(failure) => {
            tracing::info!(error = %failure, details = ?failure.details(), "Registration rejected");
            metrics::record_registration("invalid");
            return Err(failure.into());
        }
    };

    tracing::info!(
        name = record.name(),
        email = record.email(),
        status = %record.status(),
        "New registration received"
    );

    let submitted_at = Utc::now();
    match state.sheets.append_record(&record, submitted_at).await {
        Ok(result) => {
            tracing::info!(
                email = record.email(),
                rows_updated = result.rows_updated,
                range = %result.range,
                "Registration saved"
            );
            metrics::record_registration("saved");
            Ok(Json(json!({
                "success": true,
                "message": "Registration submitted successfully!",
                "data": {
                    "name": record.name(),
                    "email": record.email(),
                    "status": record.status().as_str(),
                    "submittedAt": submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
                },
            })))
        }
        Err(source) => {
            tracing::error!(error = %source, kind = source.kind(), "Failed to save registration");
            metrics::record_sheet_error(source.kind());
            metrics::record_registration("failed");
            Err(ApiError::Upstream {
                source,
                expose_details: !state.config.is_production(),
            })
        }
    }
}

/// `GET /api/test-sheets`: check access and create the header row if needed.
pub async fn test_sheets(State(state): State<AppState>) -> Response {
    tracing::info!("Testing Google Sheets connection");

    let outcome = async {
        let connection = state.sheets.test_connection().await?;
        let headers = state.sheets.ensure_headers().await?;
        Ok::<_, crate::sheets::SheetError>((connection, headers))
    }
    .await;

    match outcome {
        Ok((connection, headers)) => Json(json!({
            "success": true,
            "message": "Google Sheets connection successful",
            "connection": connection,
            "headers": headers,
        }))
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, kind = err.kind(), "Sheets connection test failed");
            metrics::record_sheet_error(err.kind());

            let mut body = json!({
                "success": false,
                "error": "Google Sheets connection failed",
                "troubleshooting": { "checkList": TROUBLESHOOTING },
            });
            if !state.config.is_production() {
                body["details"] = Value::String(err.to_string());
            }
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

/// Fallback for unmatched routes.
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
