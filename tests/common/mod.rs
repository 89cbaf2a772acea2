//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::net::TcpListener;

use wechat_receiver::config::{ReceiverConfig, ReceiverServerConfig};
use wechat_receiver::crypto::{self, AesKey};
use wechat_receiver::receiver::MessageHandler;
use wechat_receiver::{HttpServer, Shutdown};

pub const APP_ID: &str = "wx2169a1c982fe6157";
pub const TOKEN: &str = "4c9184f37cff01bcdc32dc486ec36961";
pub const AES_KEY: &str = "trjsFvOlHtVtIu5fZn390NzJUuMlK7iegzEz5D842gk";

pub const TEXT_MESSAGE: &str = "<xml><ToUserName><![CDATA[gh_39993584375c]]></ToUserName>\n<FromUserName><![CDATA[oP8vYt86psFCDN_YWUaZpPhOQDTk]]></FromUserName>\n<CreateTime>1555664951</CreateTime>\n<MsgType><![CDATA[text]]></MsgType>\n<Content><![CDATA[hi]]></Content>\n<MsgId>22271766593385610</MsgId>\n</xml>";

pub fn receiver_config() -> ReceiverConfig {
    ReceiverConfig::new(APP_ID, TOKEN).with_aes_key(AES_KEY)
}

pub fn key() -> AesKey {
    AesKey::decode(Some(AES_KEY)).unwrap()
}

/// Start a receiver on `addr` and return the handle that stops it.
pub async fn start_receiver<H>(addr: SocketAddr, receiver: ReceiverConfig, handler: H) -> (Shutdown, HttpServerHandle)
where
    H: MessageHandler + 'static,
{
    let mut config = ReceiverServerConfig::default();
    config.listener.bind_address = addr.to_string();
    config.receiver = receiver;

    let server = HttpServer::new(config, handler);
    let credentials = server.credentials();
    let listener = TcpListener::bind(addr).await.unwrap();
    let shutdown = Shutdown::new();
    let stopped = shutdown.wait();

    tokio::spawn(async move {
        let _ = server.run(listener, None, stopped).await;
    });

    (shutdown, HttpServerHandle { credentials })
}

/// What a test can still reach after the server moves into its task.
pub struct HttpServerHandle {
    pub credentials: std::sync::Arc<arc_swap::ArcSwap<ReceiverConfig>>,
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

pub fn now() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        .to_string()
}

/// Query pairs for a plain-mode callback.
pub fn plain_query(token: &str, timestamp: &str, nonce: &str) -> Vec<(&'static str, String)> {
    vec![
        ("signature", crypto::sign([token, timestamp, nonce])),
        ("timestamp", timestamp.to_string()),
        ("nonce", nonce.to_string()),
    ]
}

/// Query pairs for an encrypted-mode callback over `sealed`.
pub fn encrypted_query(token: &str, timestamp: &str, nonce: &str, sealed: &str) -> Vec<(&'static str, String)> {
    vec![
        ("msg_signature", crypto::sign([token, timestamp, nonce, sealed])),
        ("timestamp", timestamp.to_string()),
        ("nonce", nonce.to_string()),
    ]
}
