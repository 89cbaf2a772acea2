//! HTTP layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request id)
//!     → webhook.rs (query, credentials, body → handle_request)
//!     → ReceiverResponse → HTTP response
//! ```

pub mod request;
pub mod server;
pub mod webhook;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use server::HttpServer;
pub use webhook::{router, WebhookState};
