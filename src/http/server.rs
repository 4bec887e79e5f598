//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, CORS, headers)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::{Request, Response, StatusCode},
    middleware::from_fn_with_state,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::http::handlers;
use crate::http::request::{MakeRequestUuid, X_REQUEST_ID};
use crate::http::response::ApiError;
use crate::lifecycle::wait_for_shutdown;
use crate::security::{cors::cors_layer, headers::apply_security_headers, rate_limit::rate_limit_middleware};
use crate::security::{FixedWindowLimiter, RATE_LIMIT_WINDOW};
use crate::sheets::{GoogleSheetsClient, SheetError, SheetWriter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub limiter: Arc<FixedWindowLimiter>,
    pub sheets: Arc<dyn SheetWriter>,
}

/// HTTP server for the registration API.
pub struct HttpServer {
    router: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a server writing to Google Sheets.
    pub fn new(config: AppConfig) -> Result<Self, SheetError> {
        let sheets = GoogleSheetsClient::from_config(&config.sheets)?;
        Ok(Self::with_sheet_writer(config, Arc::new(sheets)))
    }

    /// Create a server writing to an arbitrary sheet backend.
    pub fn with_sheet_writer(config: AppConfig, sheets: Arc<dyn SheetWriter>) -> Self {
        let limiter = Arc::new(FixedWindowLimiter::new(
            config.rate_limit.max_requests,
            RATE_LIMIT_WINDOW,
        ));
        Self::from_state(AppState {
            config: Arc::new(config),
            limiter,
            sheets,
        })
    }

    /// Create a server from fully assembled state.
    pub fn from_state(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let production = config.is_production();

        // Only submissions count against the limit.
        let register = post(handlers::register)
            .layer(from_fn_with_state(state.clone(), rate_limit_middleware))
            .get(handlers::register_info);

        let mut router = Router::new()
            .route("/api/health", get(handlers::health))
            .route("/api/register", register)
            .route("/api/test-sheets", get(handlers::test_sheets))
            .fallback(handlers::not_found)
            .with_state(state);

        if config.security.enable_headers {
            router = apply_security_headers(router);
        }

        router
            .layer(cors_layer(&config.cors))
            .layer(DefaultBodyLimit::disable())
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send + 'static>| {
                panic_response(panic, production)
            }))
            .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(&X_REQUEST_ID)
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid))
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            environment = %self.config.environment,
            rate_limit = self.config.rate_limit.max_requests,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>, production: bool) -> Response<Body> {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    tracing::error!(panic = %message, "Request handler panicked");

    let mut response = ApiError::Internal {
        message,
        expose_details: !production,
    }
    .into_response();
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registration::RegistrationRecord;
    use crate::sheets::{HeaderSetup, SheetAppendResult, SheetInfo};
    use async_trait::async_trait;
    use axum::body::to_bytes;
    use chrono::{DateTime, Utc};
    use serde_json::Value;
    use tower::ServiceExt;

    struct Unreachable;

    #[async_trait]
    impl SheetWriter for Unreachable {
        async fn append_record(
            &self,
            _record: &RegistrationRecord,
            _submitted_at: DateTime<Utc>,
        ) -> Result<SheetAppendResult, SheetError> {
            Err(SheetError::QuotaExceeded("Quota exceeded for quota metric".into()))
        }

        async fn test_connection(&self) -> Result<SheetInfo, SheetError> {
            Err(SheetError::NotFound("Requested entity was not found.".into()))
        }

        async fn ensure_headers(&self) -> Result<HeaderSetup, SheetError> {
            Ok(HeaderSetup::existing())
        }
    }

    fn server(config: AppConfig) -> Router {
        HttpServer::with_sheet_writer(config, Arc::new(Unreachable)).router()
    }

    async fn call(router: Router, request: Request<Body>) -> (StatusCode, Response<Body>, Value) {
        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, Response::from_parts(parts, Body::empty()), json)
    }

    #[tokio::test]
    async fn test_health_has_request_id_and_headers() {
        let request = Request::get("/api/health").body(Body::empty()).unwrap();
        let (status, response, body) = call(server(AppConfig::default()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "OK");
        assert_eq!(body["environment"], "development");
        assert!(response.headers().contains_key(&X_REQUEST_ID));
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let request = Request::get("/api/health")
            .header(&X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        let (_, response, _) = call(server(AppConfig::default()), request).await;
        assert_eq!(response.headers()[&X_REQUEST_ID], "abc-123");
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let request = Request::get("/nope").body(Body::empty()).unwrap();
        let (status, _, body) = call(server(AppConfig::default()), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_quota_failure_is_503() {
        let request = Request::post("/api/register")
            .header("content-type", "application/json")
            .body(Body::from(
                r#"{"name":"Jane Doe","email":"jane@example.com","phone":"9876543210","status":"single"}"#,
            ))
            .unwrap();
        let (status, _, body) = call(server(AppConfig::default()), request).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["code"], "QUOTA_EXCEEDED");
    }

    #[tokio::test]
    async fn test_sheets_failure_hides_details_in_production() {
        let config = AppConfig {
            environment: "production".to_string(),
            ..AppConfig::default()
        };
        let request = Request::get("/api/test-sheets").body(Body::empty()).unwrap();
        let (status, _, body) = call(server(config), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["troubleshooting"]["checkList"].as_array().unwrap().len(), 4);
        assert!(body.get("details").is_none());
    }

    #[test]
    fn test_panic_response_hides_message_in_production() {
        let response = panic_response(Box::new("boom"), true);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
