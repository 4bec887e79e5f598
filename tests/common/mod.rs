//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use event_registration::config::AppConfig;
use event_registration::http::{AppState, HttpServer};
use event_registration::lifecycle::Shutdown;
use event_registration::registration::RegistrationRecord;
use event_registration::security::{FixedWindowLimiter, ManualClock, RATE_LIMIT_WINDOW};
use event_registration::sheets::{HeaderSetup, SheetAppendResult, SheetError, SheetInfo, SheetWriter};

/// Sheet writer that keeps rows in memory and can be told to fail.
#[derive(Default)]
pub struct InMemorySheetWriter {
    rows: Mutex<Vec<RegistrationRecord>>,
    failure: Mutex<Option<SheetError>>,
}

impl InMemorySheetWriter {
    pub fn rows(&self) -> Vec<RegistrationRecord> {
        self.rows.lock().unwrap().clone()
    }

    pub fn fail_with(&self, err: SheetError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    fn check(&self) -> Result<(), SheetError> {
        match self.failure.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SheetWriter for InMemorySheetWriter {
    async fn append_record(
        &self,
        record: &RegistrationRecord,
        _submitted_at: DateTime<Utc>,
    ) -> Result<SheetAppendResult, SheetError> {
        self.check()?;
        let mut rows = self.rows.lock().unwrap();
        rows.push(record.clone());
        Ok(SheetAppendResult {
            rows_updated: 1,
            range: format!("Form Responses!A{0}:F{0}", rows.len() + 1),
        })
    }

    async fn test_connection(&self) -> Result<SheetInfo, SheetError> {
        self.check()?;
        Ok(SheetInfo {
            sheet_title: "Registrations".to_string(),
            sheet_id: "test-sheet".to_string(),
        })
    }

    async fn ensure_headers(&self) -> Result<HeaderSetup, SheetError> {
        self.check()?;
        Ok(HeaderSetup::existing())
    }
}

/// A running server and the handles tests need to drive it.
pub struct TestApp {
    pub addr: SocketAddr,
    pub sheets: Arc<InMemorySheetWriter>,
    pub clock: Arc<ManualClock>,
    pub shutdown: Shutdown,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the API on an ephemeral port with an in-memory sheet and a manual clock.
pub async fn spawn_app(config: AppConfig) -> TestApp {
    let sheets = Arc::new(InMemorySheetWriter::default());
    let clock = Arc::new(ManualClock::new());
    let limiter = FixedWindowLimiter::with_clock(
        config.rate_limit.max_requests,
        RATE_LIMIT_WINDOW,
        clock.clone(),
    );

    let state = AppState {
        config: Arc::new(config),
        limiter: Arc::new(limiter),
        sheets: sheets.clone(),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::from_state(state);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });

    TestApp {
        addr,
        sheets,
        clock,
        shutdown,
    }
}

/// Request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

/// Start a programmable mock backend on an ephemeral port.
///
/// The handler sees each request and returns a status and JSON body.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                let (status, body) = f(request).await;
                let status_text = match status {
                    200 => "200 OK",
                    400 => "400 Bad Request",
                    401 => "401 Unauthorized",
                    403 => "403 Forbidden",
                    404 => "404 Not Found",
                    429 => "429 Too Many Requests",
                    500 => "500 Internal Server Error",
                    503 => "503 Service Unavailable",
                    _ => "200 OK",
                };

                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_text,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();
    let header = |wanted: &str| {
        headers
            .iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, value)| value.clone())
    };
    let content_length = header("content-length")
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(0);
    let authorization = header("authorization");

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();
    Some(RecordedRequest {
        method,
        path,
        authorization,
        body,
    })
}
