//! Configuration file watcher for credential hot reload.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use crate::config::loader::load_config;
use crate::config::schema::{ReceiverConfig, ReceiverServerConfig};

/// Watches the configuration file and forwards credential changes.
pub struct ConfigWatcher {
    path: PathBuf,
    current: ReceiverServerConfig,
    update_tx: mpsc::UnboundedSender<ReceiverServerConfig>,
}

impl ConfigWatcher {
    /// Create a watcher seeded with the configuration already in use.
    ///
    /// Returns the watcher and a receiver for configuration updates.
    pub fn new(
        path: &Path,
        current: ReceiverServerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ReceiverServerConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (Self {
            path: path.to_path_buf(),
            current,
            update_tx,
        }, update_rx)
    }

    /// Start watching the file in a background thread.
    ///
    /// The returned watcher must be kept alive for updates to flow.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let tx = self.update_tx;
        let path = self.path.clone();
        let last = Mutex::new(self.current);

        let mut watcher = RecommendedWatcher::new(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(e) => {
                    tracing::error!(error = %e, "Config watch error");
                    return;
                }
            };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }

            let new_config = match load_config(&path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to reload config, keeping current credentials");
                    return;
                }
            };

            let Ok(mut last) = last.lock() else {
                return;
            };
            if requires_restart(&last, &new_config) {
                tracing::warn!("Listener or webhook settings changed; restart to apply them");
            }
            if !needs_update(&last, &new_config) {
                tracing::debug!("Config file touched without credential changes");
                return;
            }
            tracing::info!(id = %new_config.receiver.id, "Receiver credentials reloaded");
            *last = new_config.clone();
            let _ = tx.send(new_config);
        }, Config::default().with_poll_interval(Duration::from_secs(2)))?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;

        tracing::info!(path = ?self.path, "Config watcher started");
        Ok(watcher)
    }
}

fn needs_update(current: &ReceiverServerConfig, next: &ReceiverServerConfig) -> bool {
    credentials(current) != credentials(next)
}

fn credentials(config: &ReceiverServerConfig) -> &ReceiverConfig {
    &config.receiver
}

fn requires_restart(current: &ReceiverServerConfig, next: &ReceiverServerConfig) -> bool {
    current.listener.bind_address != next.listener.bind_address
        || current.webhook.path != next.webhook.path
        || current.webhook.auto_reply != next.webhook.auto_reply
        || current.security.max_body_size != next.security.max_body_size
        || current.timeouts.request_secs != next.timeouts.request_secs
}
