//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ReceiverServerConfig (validated, immutable)
//!     → receiver credentials shared via ArcSwap with the webhook route
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of Arc<ReceiverConfig>
//!     → next request sees new credentials
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Only receiver credentials hot-reload; listener and route need a restart

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, ConfigError};
pub use schema::ReceiverServerConfig;
pub use schema::ReceiverConfig;
pub use schema::ReceiverConfigOverride;
pub use schema::{ListenerConfig, ObservabilityConfig, WebhookConfig};
