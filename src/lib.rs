//! WeChat-style callback receiver.
//!
//! Verifies signed platform callbacks, decrypts encrypted payloads, hands the
//! decoded XML message to a [`receiver::MessageHandler`] and encodes its
//! reply, optionally sealed in a signed encryption envelope.

pub mod config;
pub mod crypto;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod receiver;
pub mod xml;

pub use config::schema::ReceiverServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use receiver::{handle_request, MessageHandler, Reply};
pub use xml::{Message, XmlValue};
