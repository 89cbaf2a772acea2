//! Framework-neutral request state machine.

use std::future::Future;

use axum::http::{Method, StatusCode};

use crate::config::ReceiverConfig;
use crate::receiver::error::{BoxError, ReceiverError};
use crate::receiver::query::RequestQuery;
use crate::receiver::reply::{stringify, Reply};
use crate::receiver::verify::{parse, verify, InboundBody};
use crate::xml::Message;

pub const INVALID_SIGNATURE: &str = "Invalid signature";
pub const NOT_IMPLEMENTED: &str = "Not Implemented";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// Business logic invoked for every authenticated message.
///
/// `id` is the app id recovered from decryption, or the configured id for
/// plaintext callbacks. Any closure `Fn(Message, String) -> impl Future`
/// resolving to `Result<Reply, BoxError>` implements this.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, message: Message, id: String) -> impl Future<Output = Result<Reply, BoxError>> + Send;
}

impl<F, Fut> MessageHandler for F
where
    F: Fn(Message, String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Reply, BoxError>> + Send,
{
    fn handle(&self, message: Message, id: String) -> impl Future<Output = Result<Reply, BoxError>> + Send {
        self(message, id)
    }
}

/// Response computed by [`handle_request`], independent of any framework.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiverResponse {
    pub status: StatusCode,
    pub content_type: Option<&'static str>,
    pub body: String,
}

impl ReceiverResponse {
    fn text(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            body: body.into(),
        }
    }

    fn xml(body: String) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(XML_CONTENT_TYPE),
            body,
        }
    }

    fn unauthorized() -> Self {
        Self::text(StatusCode::UNAUTHORIZED, INVALID_SIGNATURE)
    }
}

/// Run one callback through verification, the handler and reply encoding.
///
/// GET answers the ownership challenge, POST dispatches a message, and any
/// other method gets 501 without touching the signature.
pub async fn handle_request<H: MessageHandler>(
    config: &ReceiverConfig,
    method: &Method,
    query: &RequestQuery,
    body: Option<&InboundBody>,
    handler: &H,
) -> Result<ReceiverResponse, ReceiverError> {
    tracing::debug!(method = %method, mode = query.mode().as_str(), "Handling callback");

    if *method == Method::GET {
        return Ok(match verify(config, query)? {
            Ok(verified) => ReceiverResponse::text(StatusCode::OK, verified.message),
            Err(_) => ReceiverResponse::unauthorized(),
        });
    }

    if *method != Method::POST {
        return Ok(ReceiverResponse::text(StatusCode::NOT_IMPLEMENTED, NOT_IMPLEMENTED));
    }

    let verified = match parse(config, query, body)? {
        Ok(verified) => verified,
        Err(_) => return Ok(ReceiverResponse::unauthorized()),
    };
    let id = verified
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| config.id.clone());

    let reply = handler
        .handle(verified.message.clone(), id)
        .await
        .map_err(ReceiverError::Handler)?;
    let body = stringify(config, query.mode(), &verified.message, reply)?;

    Ok(ReceiverResponse::xml(body))
}
