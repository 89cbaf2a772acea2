//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the receiver.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the receiver service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ReceiverServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Platform credentials used to verify and answer callbacks.
    pub receiver: ReceiverConfig,

    /// Webhook route settings.
    pub webhook: WebhookConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Credentials for one platform integration.
///
/// `aes_key` being set does not by itself turn on encryption: the mode is
/// chosen per request by the query string.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// App id / corp id / suite id embedded in encrypted replies.
    #[serde(alias = "appid")]
    pub id: String,

    /// Shared secret mixed into every signature.
    pub token: String,

    /// 43-character unpadded base64 key (EncodingAESKey).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aes_key: Option<String>,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            id: String::new(),
            // WARNING: This is a placeholder! Change this in production.
            token: "CHANGE_ME_IN_PRODUCTION".to_string(),
            aes_key: None,
        }
    }
}

impl std::fmt::Debug for ReceiverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverConfig")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .field("aes_key", &self.aes_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ReceiverConfig {
    pub fn new(id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            token: token.into(),
            aes_key: None,
        }
    }

    pub fn with_aes_key(mut self, aes_key: impl Into<String>) -> Self {
        self.aes_key = Some(aes_key.into());
        self
    }

    /// Apply a request-scoped override on top of this config.
    pub fn merged(&self, over: &ReceiverConfigOverride) -> ReceiverConfig {
        ReceiverConfig {
            id: over.id.clone().unwrap_or_else(|| self.id.clone()),
            token: over.token.clone().unwrap_or_else(|| self.token.clone()),
            aes_key: over.aes_key.clone().or_else(|| self.aes_key.clone()),
        }
    }
}

/// Per-request credential override (multi-tenant endpoints).
///
/// Insert it into the request extensions ahead of the webhook route.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReceiverConfigOverride {
    pub id: Option<String>,
    pub token: Option<String>,
    pub aes_key: Option<String>,
}

/// Webhook route configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Path the platform calls back on.
    pub path: String,

    /// Text reply sent for every message; `None` acknowledges with `success`.
    pub auto_reply: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: "/wechat".to_string(),
            auto_reply: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (handler included) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        // The platform gives up on a callback after 5 seconds.
        Self { request_secs: 5 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_toml() {
        let config: ReceiverServerConfig = toml::from_str(
            r#"
            [receiver]
            appid = "wx2169a1c982fe6157"
            token = "4c9184f37cff01bcdc32dc486ec36961"
            "#,
        )
        .unwrap();
        assert_eq!(config.receiver.id, "wx2169a1c982fe6157");
        assert_eq!(config.receiver.aes_key, None);
        assert_eq!(config.webhook.path, "/wechat");
        assert_eq!(config.listener.bind_address, "0.0.0.0:3000");
    }

    #[test]
    fn test_override_merge() {
        let base = ReceiverConfig::new("wx1", "t1").with_aes_key("k1");
        let over = ReceiverConfigOverride {
            token: Some("t2".into()),
            ..Default::default()
        };
        let merged = base.merged(&over);
        assert_eq!(merged.id, "wx1");
        assert_eq!(merged.token, "t2");
        assert_eq!(merged.aes_key.as_deref(), Some("k1"));
        assert_eq!(base.merged(&ReceiverConfigOverride::default()), base);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ReceiverConfig::new("wx1", "secret-token").with_aes_key("secret-key");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret"));
        assert!(debug.contains("wx1"));
    }
}
