//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::ReceiverServerConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ReceiverServerConfig, ConfigError> {
    let config: ReceiverServerConfig = toml::from_str(content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ReceiverServerConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    parse_config(&content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("receiver-config-{}.toml", uuid::Uuid::new_v4()));
        fs::write(
            &path,
            r#"
            [listener]
            bind_address = "127.0.0.1:3900"

            [receiver]
            id = "ww073d566727158bca"
            token = "4c9184f37cff01bcdc32dc486ec36961"
            aes_key = "trjsFvOlHtVtIu5fZn390NzJUuMlK7iegzEz5D842gk"

            [webhook]
            path = "/callback"
            auto_reply = "received"
            "#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:3900");
        assert_eq!(config.webhook.auto_reply.as_deref(), Some("received"));

        fs::remove_file(&path).unwrap_or_default();
    }

    #[test]
    fn test_errors() {
        assert!(matches!(load_config(Path::new("/nonexistent/receiver.toml")), Err(ConfigError::Io(_))));
        assert!(matches!(parse_config("receiver = 5"), Err(ConfigError::Parse(_))));

        let err = parse_config("[webhook]\npath = \"nope\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v.len() == 1));
        assert_eq!(err.to_string(), "Validation failed: webhook.path: must start with '/'");

        let err = parse_config("[webhook]\npath = \"/hooks/:id\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref v) if v[0].field == "webhook.path"));
    }
}
