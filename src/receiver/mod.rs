//! Callback receiver.
//!
//! # Data Flow
//! ```text
//! HTTP adapter
//!     → query.rs (signature mode and parameters)
//!     → verify.rs (signature check, decrypt, parse <xml>)
//!     → MessageHandler (business logic)
//!     → reply.rs (patch routing fields, build XML, seal if encrypted)
//!     → ReceiverResponse (status, content type, body)
//! ```
//!
//! Verification failures never carry detail to the caller; the reason is
//! logged and counted, and the caller sees 401 "Invalid signature".

pub mod error;
pub mod handler;
pub mod query;
pub mod reply;
pub mod verify;

pub use error::{BoxError, ReceiverError, RejectedRequest};
pub use handler::{handle_request, MessageHandler, ReceiverResponse};
pub use query::{RequestQuery, SignatureMode};
pub use reply::{patch_reply_message, stringify, Reply};
pub use verify::{parse, verify, InboundBody, Verification, VerifiedMessage};
