//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID, JSON / form body decoding)
//!     → handlers.rs (health, registration, sheet diagnostics)
//!     → response.rs (error → status + JSON body)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, RegistrationPayload, X_REQUEST_ID};
pub use response::{ApiError, ErrorCode};
pub use server::{AppState, HttpServer};
