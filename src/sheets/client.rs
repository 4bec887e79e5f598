//! Google Sheets API v4 client.
//!
//! # Responsibilities
//! - Append one row per registration (columns A–F)
//! - Create the header row on first setup
//! - Report spreadsheet identity for diagnostics
//! - Turn Google error envelopes into typed [`SheetError`]s
//!
//! # Design Decisions
//! - No retries: a failed write is reported to the caller immediately
//! - Every call is bounded by `sheets.timeout_secs`
//! - A missing spreadsheet id is reported per call, not at startup, so the
//!   service still serves health checks while misconfigured

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::config::SheetsConfig;
use crate::observability::metrics;
use crate::registration::RegistrationRecord;
use crate::sheets::auth::{TokenProvider, TokenSource};
use crate::sheets::types::{
    ApiErrorEnvelope, HeaderSetup, SheetAppendResult, SheetError, SheetInfo, SheetWriter, HEADER_ROW,
    PAYMENT_PENDING,
};

const VALUE_INPUT_OPTION: &str = "USER_ENTERED";

/// Spreadsheet client authenticated as a service account.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    api_base: Url,
    spreadsheet_id: Option<String>,
    sheet_name: String,
    timestamp_offset: FixedOffset,
    timeout_secs: u64,
}

impl GoogleSheetsClient {
    /// Create a client from configuration.
    pub fn from_config(config: &SheetsConfig) -> Result<Self, SheetError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SheetError::Configuration(format!("failed to build HTTP client: {e}")))?;

        let api_base = Url::parse(&config.api_base).map_err(|e| {
            SheetError::Configuration(format!("invalid Sheets API URL '{}': {e}", config.api_base))
        })?;

        let timestamp_offset = FixedOffset::east_opt(config.timestamp_utc_offset_minutes * 60)
            .ok_or_else(|| {
                SheetError::Configuration(format!(
                    "invalid UTC offset of {} minutes",
                    config.timestamp_utc_offset_minutes
                ))
            })?;

        let tokens = TokenProvider::new(TokenSource::from_config(config), http.clone(), timeout);
        if !tokens.is_configured() {
            tracing::warn!("Google credentials are not configured; sheet writes will fail");
        }
        if config.spreadsheet_id.is_none() {
            tracing::warn!("GOOGLE_SHEET_ID is not set; sheet writes will fail");
        }

        tracing::info!(
            sheet_name = %config.sheet_name,
            project_id = config.project_id.as_deref().unwrap_or("-"),
            "Google Sheets client initialized"
        );

        Ok(Self {
            http,
            tokens,
            api_base,
            spreadsheet_id: config.spreadsheet_id.clone(),
            sheet_name: config.sheet_name.clone(),
            timestamp_offset,
            timeout_secs: config.timeout_secs,
        })
    }

    fn spreadsheet_id(&self) -> Result<&str, SheetError> {
        self.spreadsheet_id.as_deref().ok_or_else(|| {
            SheetError::Configuration("GOOGLE_SHEET_ID environment variable is required".to_string())
        })
    }

    /// `{api}/v4/spreadsheets/{id}[/values/{tail}]`, each segment encoded.
    fn spreadsheet_url(&self, values_tail: Option<&str>) -> Result<Url, SheetError> {
        let id = self.spreadsheet_id()?;
        let mut url = self.api_base.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                SheetError::Configuration(format!("Sheets API URL '{}' cannot be a base", self.api_base))
            })?;
            segments.pop_if_empty().extend(["v4", "spreadsheets", id]);
            if let Some(tail) = values_tail {
                segments.extend(["values", tail]);
            }
        }
        Ok(url)
    }

    fn range(&self, cells: &str) -> String {
        format!("{}!{}", self.sheet_name, cells)
    }

    /// Row written for one registration.
    pub fn registration_row(&self, record: &RegistrationRecord, submitted_at: DateTime<Utc>) -> Vec<String> {
        vec![
            format_timestamp(submitted_at, self.timestamp_offset),
            record.name().to_string(),
            record.email().to_string(),
            record.phone().to_string(),
            record.status().to_string(),
            PAYMENT_PENDING.to_string(),
        ]
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, SheetError> {
        let token = self.tokens.access_token().await?;
        let response = request
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| SheetError::from_transport(e, self.timeout_secs))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| SheetError::Unknown(format!("malformed Sheets API response: {e}")));
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiErrorEnvelope::classify(status, &body))
    }
}

#[async_trait]
impl SheetWriter for GoogleSheetsClient {
    async fn append_record(
        &self,
        record: &RegistrationRecord,
        submitted_at: DateTime<Utc>,
    ) -> Result<SheetAppendResult, SheetError> {
        let url = self.spreadsheet_url(Some(&format!("{}:append", self.range("A:F"))))?;
        let body = json!({ "values": [self.registration_row(record, submitted_at)] });

        let started = Instant::now();
        let result: Result<AppendResponse, SheetError> = self
            .send(
                self.http
                    .post(url)
                    .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
                    .json(&body),
            )
            .await;
        metrics::record_append_duration(started);

        let updates = result?.updates;
        tracing::info!(
            rows_updated = updates.updated_rows,
            range = %updates.updated_range,
            "Registration added to sheet"
        );

        Ok(SheetAppendResult {
            rows_updated: updates.updated_rows,
            range: updates.updated_range,
        })
    }

    async fn test_connection(&self) -> Result<SheetInfo, SheetError> {
        let url = self.spreadsheet_url(None)?;
        let spreadsheet: Spreadsheet = self
            .send(
                self.http
                    .get(url)
                    .query(&[("fields", "spreadsheetId,properties.title")]),
            )
            .await?;

        tracing::info!(title = %spreadsheet.properties.title, "Connected to spreadsheet");
        Ok(SheetInfo {
            sheet_title: spreadsheet.properties.title,
            sheet_id: spreadsheet.spreadsheet_id,
        })
    }

    async fn ensure_headers(&self) -> Result<HeaderSetup, SheetError> {
        let range = self.range("A1:F1");
        let url = self.spreadsheet_url(Some(&range))?;

        let existing: ValueRange = self.send(self.http.get(url.clone())).await?;
        if !existing.values.is_empty() {
            tracing::info!("Sheet headers already exist");
            return Ok(HeaderSetup::existing());
        }

        let _: Value = self
            .send(
                self.http
                    .put(url)
                    .query(&[("valueInputOption", VALUE_INPUT_OPTION)])
                    .json(&json!({ "range": range, "values": [HEADER_ROW] })),
            )
            .await?;

        tracing::info!("Sheet headers created");
        Ok(HeaderSetup::created())
    }
}

/// `dd/mm/yyyy, hh:mm:ss am` in the given offset.
pub fn format_timestamp(at: DateTime<Utc>, offset: FixedOffset) -> String {
    at.with_timezone(&offset)
        .format("%d/%m/%Y, %I:%M:%S %P")
        .to_string()
}

#[derive(Deserialize)]
struct AppendResponse {
    updates: AppendUpdates,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: u32,
    #[serde(default)]
    updated_range: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Spreadsheet {
    spreadsheet_id: String,
    properties: SpreadsheetProperties,
}

#[derive(Deserialize)]
struct SpreadsheetProperties {
    title: String,
}

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}
