//! Axum adapter for the callback receiver.
//!
//! Translates an HTTP request into [`handle_request`] inputs and the
//! [`ReceiverResponse`] back into an HTTP response.

use std::sync::Arc;
use std::time::Instant;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::config::{ReceiverConfig, ReceiverConfigOverride};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::receiver::{handle_request, InboundBody, MessageHandler, ReceiverResponse, RequestQuery};

/// Default cap on buffered callback bodies.
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Shared state for the webhook route.
pub struct WebhookState<H> {
    config: Arc<ArcSwap<ReceiverConfig>>,
    handler: Arc<H>,
    max_body_size: usize,
}

impl<H> Clone for WebhookState<H> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            handler: self.handler.clone(),
            max_body_size: self.max_body_size,
        }
    }
}

impl<H: MessageHandler + 'static> WebhookState<H> {
    pub fn new(config: ReceiverConfig, handler: H) -> Self {
        Self::with_shared_config(Arc::new(ArcSwap::from_pointee(config)), Arc::new(handler))
    }

    /// Build on a credentials handle that someone else may swap.
    pub fn with_shared_config(config: Arc<ArcSwap<ReceiverConfig>>, handler: Arc<H>) -> Self {
        Self {
            config,
            handler,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }

    pub fn with_max_body_size(mut self, max_body_size: usize) -> Self {
        self.max_body_size = max_body_size;
        self
    }

    /// Handle to the credentials in use.
    pub fn credentials(&self) -> Arc<ArcSwap<ReceiverConfig>> {
        self.config.clone()
    }
}

/// A router serving the receiver on `path` for every HTTP method.
pub fn router<H: MessageHandler + 'static>(path: &str, state: WebhookState<H>) -> Router {
    Router::new()
        .route(path, any(webhook_handler::<H>))
        .with_state(state)
}

async fn webhook_handler<H: MessageHandler + 'static>(
    State(state): State<WebhookState<H>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers).to_string();

    let query = match Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        Ok(Query(pairs)) => RequestQuery::from_pairs(pairs),
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Unreadable query string");
            RequestQuery::from_pairs(Vec::<(String, String)>::new())
        }
    };

    let base = state.config.load_full();
    let config = match parts.extensions.get::<ReceiverConfigOverride>() {
        Some(over) => base.merged(over),
        None => ReceiverConfig::clone(&base),
    };

    let bytes = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Failed to read callback body");
            metrics::record_request(parts.method.as_str(), StatusCode::BAD_REQUEST.as_u16(), start);
            return (StatusCode::BAD_REQUEST, "Bad Request").into_response();
        }
    };
    let inbound = (!bytes.is_empty()).then(|| InboundBody::Raw(String::from_utf8_lossy(&bytes).into_owned()));

    let response = match handle_request(&config, &parts.method, &query, inbound.as_ref(), state.handler.as_ref()).await {
        Ok(res) => res.into_response(),
        Err(e) => {
            tracing::error!(request_id = %request_id, kind = e.kind(), error = %e, "Callback failed");
            metrics::record_handler_error(e.kind());
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    };

    tracing::debug!(
        request_id = %request_id,
        method = %parts.method,
        status = response.status().as_u16(),
        "Callback handled"
    );
    metrics::record_request(parts.method.as_str(), response.status().as_u16(), start);
    response
}

impl IntoResponse for ReceiverResponse {
    fn into_response(self) -> Response {
        match self.content_type {
            Some(content_type) => (self.status, [(header::CONTENT_TYPE, content_type)], self.body).into_response(),
            None => (self.status, self.body).into_response(),
        }
    }
}
