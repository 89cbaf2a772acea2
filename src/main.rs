//! Standalone callback receiver.
//!
//! ```text
//! wechat-receiver [config.toml]
//! ```
//!
//! Acknowledges every verified message with `success`, or answers with
//! `webhook.auto_reply` when it is set. Receiver credentials hot-reload
//! when the config file changes.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use wechat_receiver::config::watcher::ConfigWatcher;
use wechat_receiver::config::{load_config, ReceiverServerConfig};
use wechat_receiver::observability::{logging, metrics};
use wechat_receiver::receiver::BoxError;
use wechat_receiver::{HttpServer, Message, Reply, Shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match &config_path {
        Some(path) => load_config(path)?,
        None => ReceiverServerConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!("wechat-receiver v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        path = %config.webhook.path,
        id = %config.receiver.id,
        encryption_key = config.receiver.aes_key.is_some(),
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );
    if config_path.is_none() {
        tracing::warn!("No config file given, running with defaults");
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher stops when dropped, so it lives for the whole of main.
    let (_watcher, config_updates) = match &config_path {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path, config.clone());
            match watcher.run() {
                Ok(handle) => (Some(handle), Some(updates)),
                Err(e) => {
                    tracing::error!(error = %e, "Config watcher disabled");
                    (None, None)
                }
            }
        }
        None => (None, None),
    };

    let auto_reply: Arc<Option<String>> = Arc::new(config.webhook.auto_reply.clone());
    let handler = move |message: Message, id: String| {
        let auto_reply = auto_reply.clone();
        async move {
            tracing::info!(
                id = %id,
                msg_type = message.get_str("MsgType").unwrap_or("unknown"),
                from = message.get_str("FromUserName").unwrap_or_default(),
                "Message received"
            );
            Ok::<_, BoxError>(Reply::from((*auto_reply).clone()))
        }
    };

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for callbacks");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, handler);
    server.run(listener, config_updates, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
