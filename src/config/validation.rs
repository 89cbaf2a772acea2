//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check credentials are usable (token present, aes key decodes)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ReceiverServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ReceiverServerConfig;
use crate::crypto::AesKey;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed configuration, collecting every error.
pub fn validate_config(config: &ReceiverServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.receiver.token.trim().is_empty() {
        errors.push(ValidationError::new("receiver.token", "must not be empty"));
    }

    if let Some(key) = config.receiver.aes_key.as_deref() {
        if let Err(e) = AesKey::decode(Some(key)) {
            errors.push(ValidationError::new("receiver.aes_key", e.to_string()));
        }
    }

    if let Some(problem) = route_path_problem(&config.webhook.path) {
        errors.push(ValidationError::new("webhook.path", problem));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new("security.max_body_size", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// The webhook path is mounted as a literal route: no captures, wildcards,
/// query or fragment.
fn route_path_problem(path: &str) -> Option<&'static str> {
    if !path.starts_with('/') {
        return Some("must start with '/'");
    }
    if path.contains(['{', '}']) {
        return Some("must not contain route captures ('{' or '}')");
    }
    if path.split('/').any(|segment| segment.starts_with([':', '*'])) {
        return Some("segments must not start with ':' or '*'");
    }
    if path.contains(['?', '#']) || path.chars().any(char::is_whitespace) {
        return Some("must be a plain path without query, fragment or whitespace");
    }
    None
}
