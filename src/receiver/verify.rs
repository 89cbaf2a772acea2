//! Signature verification for challenge (GET) and message (POST) callbacks.

use crate::config::ReceiverConfig;
use crate::crypto::{self, signature, AesKey, KeyError};
use crate::observability::metrics;
use crate::receiver::error::RejectedRequest;
use crate::receiver::query::{RequestQuery, SignatureMode};
use crate::xml::{self, Message, XmlValue, ROOT};

/// Raw POST body as handed over by the HTTP layer.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    /// Undecoded XML text.
    Raw(String),
    /// A document already parsed by a body parser; its root key is `xml`.
    Parsed(Message),
}

impl From<String> for InboundBody {
    fn from(s: String) -> Self {
        InboundBody::Raw(s)
    }
}

impl From<&str> for InboundBody {
    fn from(s: &str) -> Self {
        InboundBody::Raw(s.to_string())
    }
}

/// An authenticated payload plus the app id recovered from decryption.
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedMessage<T> {
    pub message: T,
    /// Present only when the payload was decrypted.
    pub id: Option<String>,
}

/// Outcome of verifying one request.
pub type Verification<T> = Result<VerifiedMessage<T>, RejectedRequest>;

/// Verify an endpoint-ownership challenge and recover the echo string.
///
/// The outer error is a configuration problem; the inner one is a rejected
/// request.
pub fn verify(config: &ReceiverConfig, query: &RequestQuery) -> Result<Verification<String>, KeyError> {
    let echostr = query.echostr().unwrap_or_default();

    let mut check = vec![config.token.as_str(), query.timestamp(), query.nonce()];
    if query.mode() == SignatureMode::Encrypted {
        check.push(echostr);
    }
    if !signature::matches(&crypto::sign(check), query.signature()) {
        return Ok(reject("challenge", "signature mismatch"));
    }

    match query.mode() {
        SignatureMode::Plain => Ok(Ok(VerifiedMessage {
            message: echostr.to_string(),
            id: None,
        })),
        SignatureMode::Encrypted => {
            let key = AesKey::decode(config.aes_key.as_deref())?;
            match crypto::decrypt(&key, echostr) {
                Ok(opened) => Ok(Ok(VerifiedMessage {
                    message: opened.message,
                    id: Some(opened.id),
                })),
                Err(e) => Ok(reject("challenge", &e.to_string())),
            }
        }
    }
}

/// Verify a message callback and return its decoded `<xml>` fields.
pub fn parse(
    config: &ReceiverConfig,
    query: &RequestQuery,
    body: Option<&InboundBody>,
) -> Result<Verification<Message>, KeyError> {
    let Some(body) = body else {
        return Ok(reject("message", "empty body"));
    };
    let Some(envelope) = read_envelope(body) else {
        return Ok(reject("message", "body is not an <xml> document"));
    };

    let encrypted_field = envelope.get_str("Encrypt").unwrap_or_default();
    let mut check = vec![config.token.as_str(), query.timestamp(), query.nonce()];
    if query.mode() == SignatureMode::Encrypted {
        check.push(encrypted_field);
    }
    if !signature::matches(&crypto::sign(check), query.signature()) {
        return Ok(reject("message", "signature mismatch"));
    }

    if query.mode() == SignatureMode::Plain {
        return Ok(Ok(VerifiedMessage {
            message: envelope,
            id: None,
        }));
    }

    let key = AesKey::decode(config.aes_key.as_deref())?;
    let opened = match crypto::decrypt(&key, encrypted_field) {
        Ok(opened) => opened,
        Err(e) => return Ok(reject("message", &e.to_string())),
    };
    if opened.message.is_empty() {
        return Ok(reject("message", "decrypted message is empty"));
    }
    match xml::parse_root(&opened.message) {
        Some(inner) => Ok(Ok(VerifiedMessage {
            message: inner,
            id: Some(opened.id),
        })),
        None => Ok(reject("message", "decrypted payload is not an <xml> document")),
    }
}

fn read_envelope(body: &InboundBody) -> Option<Message> {
    match body {
        InboundBody::Raw(text) if text.trim().is_empty() => None,
        InboundBody::Raw(text) => xml::parse_root(text),
        InboundBody::Parsed(doc) => doc.get(ROOT).and_then(XmlValue::as_object).cloned(),
    }
}

/// Log the reason server-side and collapse it into a detail-free rejection.
fn reject<T>(stage: &'static str, reason: &str) -> Verification<T> {
    tracing::warn!(stage, reason, "Rejected callback");
    metrics::record_rejection(stage);
    Err(RejectedRequest)
}
