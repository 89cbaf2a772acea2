//! Passive reply construction.
//!
//! A handler returns a [`Reply`]; [`stringify`] turns it into the HTTP body,
//! back-filling routing fields from the inbound message and sealing the
//! result when the request arrived encrypted.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

use crate::config::ReceiverConfig;
use crate::crypto::{self, AesKey, KeyError};
use crate::receiver::query::SignatureMode;
use crate::xml::{self, Message, XmlValue, ITEM};

/// Body that tells the platform no reply will follow.
pub const SUCCESS: &str = "success";

/// Upper bound (exclusive) for the envelope nonce.
const NONCE_RANGE: u64 = 100_000_000_000;

/// What a handler wants sent back.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Reply {
    /// Acknowledge only.
    #[default]
    Ack,
    /// Text reply. Empty content and `"success"` are acknowledgements.
    Text(String),
    /// News reply; each entry is one article.
    News(Vec<Message>),
    /// Fully specified reply fields. A `type` key is accepted for `MsgType`.
    Raw(Message),
}

impl Reply {
    /// Whether this reply collapses to the `success` body.
    pub fn is_ack(&self) -> bool {
        match self {
            Reply::Ack => true,
            Reply::Text(content) => content.is_empty() || content == SUCCESS,
            _ => false,
        }
    }
}

impl From<&str> for Reply {
    fn from(content: &str) -> Self {
        Reply::Text(content.to_string())
    }
}

impl From<String> for Reply {
    fn from(content: String) -> Self {
        Reply::Text(content)
    }
}

impl From<Vec<Message>> for Reply {
    fn from(articles: Vec<Message>) -> Self {
        Reply::News(articles)
    }
}

impl From<Message> for Reply {
    fn from(fields: Message) -> Self {
        Reply::Raw(fields)
    }
}

impl From<()> for Reply {
    fn from(_: ()) -> Self {
        Reply::Ack
    }
}

impl<T: Into<Reply>> From<Option<T>> for Reply {
    fn from(reply: Option<T>) -> Self {
        reply.map_or(Reply::Ack, Into::into)
    }
}

/// Expand a reply into full reply fields addressed back to the sender of
/// `origin`. Returns `None` for [`Reply::Ack`].
pub fn patch_reply_message(reply: Reply, origin: &Message) -> Option<Message> {
    let mut fields = match reply {
        Reply::Ack => return None,
        Reply::Text(content) => Message::new().with("MsgType", "text").with("Content", content),
        Reply::News(articles) => Message::new().with("MsgType", "news").with(
            "Articles",
            XmlValue::Array(articles.into_iter().map(XmlValue::Object).collect()),
        ),
        Reply::Raw(fields) => fields,
    };

    if let Some(msg_type) = fields.remove("type") {
        fields.insert("MsgType", msg_type);
    }

    if let Some(count) = fields.get("Articles").and_then(article_count) {
        if fields.get("ArticleCount").map_or(true, unset_count) {
            fields.insert("ArticleCount", count);
        }
    }

    // Reply routing is the inbound routing reversed.
    backfill(&mut fields, "FromUserName", origin.get("ToUserName"));
    backfill(&mut fields, "ToUserName", origin.get("FromUserName"));
    if fields.get("CreateTime").map_or(true, XmlValue::is_blank) {
        fields.insert("CreateTime", unix_now());
    }

    Some(fields)
}

/// Render the response body for `reply`.
///
/// Fails only when `mode` is encrypted and the AES key cannot be decoded.
pub fn stringify(
    config: &ReceiverConfig,
    mode: SignatureMode,
    origin: &Message,
    reply: Reply,
) -> Result<String, KeyError> {
    if reply.is_ack() {
        return Ok(SUCCESS.to_string());
    }
    let Some(fields) = patch_reply_message(reply, origin) else {
        return Ok(SUCCESS.to_string());
    };
    let plain = xml::build(&fields);

    match mode {
        SignatureMode::Plain => Ok(plain),
        SignatureMode::Encrypted => {
            let key = AesKey::decode(config.aes_key.as_deref())?;
            Ok(xml::build(&seal(config, &key, &plain)))
        }
    }
}

/// Wrap an already-built reply in a signed encryption envelope.
fn seal(config: &ReceiverConfig, key: &AesKey, plain: &str) -> Message {
    let encrypted = crypto::encrypt(key, &config.id, plain);
    let timestamp = unix_now();
    let nonce = rand::thread_rng().gen_range(0..NONCE_RANGE);

    let ts = timestamp.to_string();
    let nc = nonce.to_string();
    let signature = crypto::sign([config.token.as_str(), ts.as_str(), nc.as_str(), encrypted.as_str()]);

    Message::new()
        .with("Encrypt", encrypted)
        .with("MsgSignature", signature)
        .with("TimeStamp", timestamp)
        .with("Nonce", nonce)
}

fn article_count(articles: &XmlValue) -> Option<usize> {
    match articles {
        XmlValue::Array(items) => Some(items.len()),
        XmlValue::Object(inner) => inner.get(ITEM).and_then(XmlValue::as_array).map(<[XmlValue]>::len),
        _ => None,
    }
}

fn unset_count(value: &XmlValue) -> bool {
    value.is_blank() || value.as_u64() == Some(0)
}

fn backfill(fields: &mut Message, key: &str, source: Option<&XmlValue>) {
    if fields.get(key).map_or(true, XmlValue::is_blank) {
        fields.insert(key, source.cloned().unwrap_or(XmlValue::Null));
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const AES_KEY: &str = "trjsFvOlHtVtIu5fZn390NzJUuMlK7iegzEz5D842gk";

    fn origin() -> Message {
        Message::new()
            .with("ToUserName", "gh_39993584375c")
            .with("FromUserName", "oP8vYt86psFCDN_YWUaZpPhOQDTk")
            .with("MsgType", "text")
            .with("Content", "hi")
    }

    fn config() -> ReceiverConfig {
        ReceiverConfig::new("wx2169a1c982fe6157", "4c9184f37cff01bcdc32dc486ec36961").with_aes_key(AES_KEY)
    }

    #[test]
    fn test_ack_variants() {
        assert!(Reply::Ack.is_ack());
        assert!(Reply::from("").is_ack());
        assert!(Reply::from("success").is_ack());
        assert!(!Reply::from("hello").is_ack());
        assert!(Reply::from(None::<String>).is_ack());
        assert_eq!(Reply::from(()), Reply::Ack);

        let body = stringify(&config(), SignatureMode::Encrypted, &origin(), "".into()).unwrap();
        assert_eq!(body, "success");
    }

    #[test]
    fn test_patch_text() {
        let fields = patch_reply_message("hello".into(), &origin()).unwrap();
        assert_eq!(fields.get_str("MsgType"), Some("text"));
        assert_eq!(fields.get_str("Content"), Some("hello"));
        assert_eq!(fields.get_str("FromUserName"), Some("gh_39993584375c"));
        assert_eq!(fields.get_str("ToUserName"), Some("oP8vYt86psFCDN_YWUaZpPhOQDTk"));
        assert!(fields.get("CreateTime").and_then(XmlValue::as_u64).is_some());
        assert_eq!(patch_reply_message(Reply::Ack, &origin()), None);
    }

    #[test]
    fn test_patch_news_counts_articles() {
        let articles = vec![
            Message::new().with("Title", "a").with("Url", "https://example.com/a"),
            Message::new().with("Title", "b").with("Url", "https://example.com/b"),
        ];
        let fields = patch_reply_message(articles.into(), &origin()).unwrap();
        assert_eq!(fields.get_str("MsgType"), Some("news"));
        assert_eq!(fields.get("ArticleCount").and_then(XmlValue::as_u64), Some(2));
        assert_eq!(fields.get("Articles").and_then(XmlValue::as_array).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_patch_raw_keeps_explicit_fields() {
        let raw = Message::new()
            .with("type", "image")
            .with("ToUserName", "someone_else")
            .with("CreateTime", 1)
            .with("Image", Message::new().with("MediaId", "m1"));
        let fields = patch_reply_message(raw.into(), &origin()).unwrap();

        assert!(!fields.contains_key("type"));
        assert_eq!(fields.get_str("MsgType"), Some("image"));
        assert_eq!(fields.get_str("ToUserName"), Some("someone_else"));
        assert_eq!(fields.get_str("FromUserName"), Some("gh_39993584375c"));
        assert_eq!(fields.get("CreateTime").and_then(XmlValue::as_u64), Some(1));
    }

    #[test]
    fn test_plain_reply_is_xml() {
        let body = stringify(&config(), SignatureMode::Plain, &origin(), "hello".into()).unwrap();
        let parsed = xml::parse_root(&body).unwrap();
        assert_eq!(parsed.get_str("Content"), Some("hello"));
        assert!(body.contains("<Content><![CDATA[hello]]></Content>"));
    }

    #[test]
    fn test_encrypted_reply_envelope() {
        let config = config();
        let body = stringify(&config, SignatureMode::Encrypted, &origin(), "hello".into()).unwrap();
        let envelope = xml::parse_root(&body).unwrap();

        let encrypted = envelope.get_str("Encrypt").unwrap();
        let timestamp = envelope.get("TimeStamp").and_then(XmlValue::as_u64).unwrap();
        let nonce = envelope.get("Nonce").and_then(XmlValue::as_u64).unwrap();
        assert!(nonce < NONCE_RANGE);

        let expected = crypto::sign([
            config.token.clone(),
            timestamp.to_string(),
            nonce.to_string(),
            encrypted.to_string(),
        ]);
        assert_eq!(envelope.get_str("MsgSignature"), Some(expected.as_str()));

        let key = AesKey::decode(Some(AES_KEY)).unwrap();
        let opened = crypto::decrypt(&key, encrypted).unwrap();
        assert_eq!(opened.id, "wx2169a1c982fe6157");
        let inner = xml::parse_root(&opened.message).unwrap();
        assert_eq!(inner.get_str("Content"), Some("hello"));
    }

    #[test]
    fn test_encrypted_reply_without_key() {
        let config = ReceiverConfig::new("id", "token");
        let err = stringify(&config, SignatureMode::Encrypted, &origin(), "hello".into());
        assert_eq!(err, Err(KeyError::Missing));
    }
}
