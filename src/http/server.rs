//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Mount the webhook route on the configured path
//! - Wire up middleware (request id, tracing, timeout, body limit)
//! - Apply credential updates from the config watcher
//! - Serve until the shutdown future resolves

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{body::Body, http::Request, Router};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ReceiverConfig, ReceiverServerConfig};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::webhook::{self, WebhookState};
use crate::receiver::MessageHandler;

/// Standalone HTTP server for the callback receiver.
pub struct HttpServer {
    router: Router,
    config: ReceiverServerConfig,
    credentials: Arc<ArcSwap<ReceiverConfig>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and handler.
    pub fn new<H: MessageHandler + 'static>(config: ReceiverServerConfig, handler: H) -> Self {
        let credentials = Arc::new(ArcSwap::from_pointee(config.receiver.clone()));
        let state = WebhookState::with_shared_config(credentials.clone(), Arc::new(handler))
            .with_max_body_size(config.security.max_body_size);

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            credentials,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<H: MessageHandler + 'static>(config: &ReceiverServerConfig, state: WebhookState<H>) -> Router {
        webhook::router(&config.webhook.path, state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "callback",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Receiver credentials arriving on `config_updates` replace the ones in
    /// use without dropping connections.
    pub async fn run<F>(
        self,
        listener: TcpListener,
        config_updates: Option<mpsc::UnboundedReceiver<ReceiverServerConfig>>,
        shutdown: F,
    ) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            path = %self.config.webhook.path,
            "HTTP server starting"
        );

        if let Some(mut updates) = config_updates {
            let credentials = self.credentials.clone();
            tokio::spawn(async move {
                while let Some(next) = updates.recv().await {
                    tracing::info!(id = %next.receiver.id, "Applying reloaded receiver credentials");
                    credentials.store(Arc::new(next.receiver));
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the live receiver credentials.
    pub fn credentials(&self) -> Arc<ArcSwap<ReceiverConfig>> {
        self.credentials.clone()
    }

    pub fn config(&self) -> &ReceiverServerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sign;
    use crate::receiver::{BoxError, Reply};
    use crate::xml::Message;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    async fn ack(_: Message, _: String) -> Result<Reply, BoxError> {
        Ok(Reply::Ack)
    }

    fn server() -> HttpServer {
        let mut config = ReceiverServerConfig::default();
        config.receiver = ReceiverConfig::new("wx1", "token");
        config.security.max_body_size = 64;
        HttpServer::new(config, ack)
    }

    #[tokio::test]
    async fn test_request_id_is_echoed() {
        let signature = sign(["token", "1", "2"]);
        let uri = format!("/wechat?signature={signature}&timestamp=1&nonce=2&echostr=x");

        let res = server()
            .router()
            .oneshot(Request::get(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("x-request-id"));

        let res = server()
            .router()
            .oneshot(
                Request::get(&uri)
                    .header("x-request-id", "given-id")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.headers()["x-request-id"], "given-id");
    }

    #[tokio::test]
    async fn test_unknown_path_is_404() {
        let res = server()
            .router()
            .oneshot(Request::get("/other").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let res = server()
            .router()
            .oneshot(
                Request::post("/wechat?signature=x")
                    .header("content-length", "1000")
                    .body(Body::from(vec![b'a'; 1000]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
