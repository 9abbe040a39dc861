//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use alias_dispatch::config::{AppConfig, BindingConfig};
use alias_dispatch::{AliasRouter, HttpServer, Shutdown};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const ADMIN_KEY: &str = "test-admin-key";

/// A running server and the handles to drive it.
pub struct TestServer {
    pub addr: SocketAddr,
    pub router: Arc<AliasRouter>,
    pub shutdown: Shutdown,
    pub config_updates: mpsc::UnboundedSender<AppConfig>,
    pub handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server (and its final flush).
    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

pub fn binding(alias: &str, route: &str) -> BindingConfig {
    BindingConfig {
        alias: alias.into(),
        route: route.into(),
    }
}

/// Config listening on `port` with the given bindings.
pub fn config_with(port: u16, bindings: Vec<BindingConfig>) -> AppConfig {
    let mut config = AppConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{port}");
    config.router.bindings = bindings;
    config
}

/// Enable the admin API on `port`.
pub fn with_admin(mut config: AppConfig, port: u16) -> AppConfig {
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config.admin.bind_address = format!("127.0.0.1:{port}");
    config
}

/// Start a server for `config` and wait until it accepts connections.
pub async fn spawn_server(config: AppConfig) -> TestServer {
    let addr: SocketAddr = config.listener.bind_address.parse().unwrap();
    let shutdown = Shutdown::new();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    let server = HttpServer::new(config).unwrap();
    let router = server.router();
    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Give the admin listener time to bind.
    tokio::time::sleep(Duration::from_millis(200)).await;

    TestServer {
        addr,
        router,
        shutdown,
        config_updates,
        handle,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
