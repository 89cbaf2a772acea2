//! Callback query-string parameters.

use std::collections::HashMap;

/// How a request is authenticated.
///
/// Chosen only by which signature parameter the platform sent, never by
/// whether an AES key is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureMode {
    /// `signature` over token, timestamp, nonce.
    Plain,
    /// `msg_signature` over token, timestamp, nonce and the ciphertext.
    Encrypted,
}

impl SignatureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignatureMode::Plain => "plain",
            SignatureMode::Encrypted => "encrypted",
        }
    }
}

/// Signature inputs from the callback URL, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestQuery {
    mode: SignatureMode,
    signature: Option<String>,
    timestamp: String,
    nonce: String,
    echostr: Option<String>,
}

impl RequestQuery {
    /// Plain-mode query.
    pub fn plain(signature: impl Into<String>, timestamp: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            mode: SignatureMode::Plain,
            signature: Some(signature.into()),
            timestamp: timestamp.into(),
            nonce: nonce.into(),
            echostr: None,
        }
    }

    /// Encrypted-mode query (`msg_signature`).
    pub fn encrypted(msg_signature: impl Into<String>, timestamp: impl Into<String>, nonce: impl Into<String>) -> Self {
        Self {
            mode: SignatureMode::Encrypted,
            ..Self::plain(msg_signature, timestamp, nonce)
        }
    }

    pub fn with_echostr(mut self, echostr: impl Into<String>) -> Self {
        self.echostr = Some(echostr.into());
        self
    }

    /// Build from decoded query pairs. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut signature: Option<String> = None;
        let mut msg_signature: Option<String> = None;
        let mut timestamp = String::new();
        let mut nonce = String::new();
        let mut echostr: Option<String> = None;

        for (key, value) in pairs {
            match key.as_ref() {
                "signature" => signature = Some(value.into()),
                "msg_signature" => msg_signature = Some(value.into()),
                "timestamp" => timestamp = value.into(),
                "nonce" => nonce = value.into(),
                "echostr" => echostr = Some(value.into()),
                _ => {}
            }
        }

        let msg_signature = msg_signature.filter(|s| !s.is_empty());
        let (mode, signature) = match msg_signature {
            Some(s) => (SignatureMode::Encrypted, Some(s)),
            None => (SignatureMode::Plain, signature.filter(|s| !s.is_empty())),
        };

        Self {
            mode,
            signature,
            timestamp,
            nonce,
            echostr,
        }
    }

    pub fn mode(&self) -> SignatureMode {
        self.mode
    }

    /// `msg_signature` in encrypted mode, `signature` otherwise.
    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn echostr(&self) -> Option<&str> {
        self.echostr.as_deref()
    }
}

impl From<&HashMap<String, String>> for RequestQuery {
    fn from(map: &HashMap<String, String>) -> Self {
        Self::from_pairs(map.iter().map(|(k, v)| (k.as_str(), v.clone())))
    }
}
