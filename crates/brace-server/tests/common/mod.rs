//! Common test utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use brace_server::{AppState, Server, ServerConfig};
use brace_session::{SessionConfig, SessionManager, SessionStorage};

/// A test server that runs in the background.
pub struct TestServer {
    /// The server's address.
    pub addr: SocketAddr,
    /// Handle to the server task.
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server over `storage` with default session settings.
    pub async fn start(storage: impl SessionStorage + 'static) -> Result<Self> {
        Self::start_with(storage, SessionConfig::default()).await
    }

    /// Start a server over `storage` with explicit session settings.
    pub async fn start_with(
        storage: impl SessionStorage + 'static,
        session_config: SessionConfig,
    ) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = ServerConfig::new()
            .with_bind_address(addr)
            .with_request_logging(false);
        let sessions = SessionManager::new(storage, session_config);
        let server = Server::new(AppState::new(sessions, config));

        let handle = tokio::spawn(async move {
            let _ = server.serve(listener).await;
        });

        wait_for_server(&Client::new(), addr).await?;

        Ok(Self {
            addr,
            _handle: handle,
        })
    }

    /// Get the base URL for the server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// A client that keeps cookies between requests, like a browser.
    pub fn browser(&self) -> Result<Client> {
        Ok(Client::builder().cookie_store(true).build()?)
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }
}

/// Wait for the server to become ready.
async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    let url = format!("http://{}/health", addr);

    let result = timeout(Duration::from_secs(5), async {
        loop {
            match client.get(&url).send().await {
                Ok(resp) if resp.status().is_success() => return,
                _ => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    })
    .await;

    match result {
        Ok(()) => Ok(()),
        Err(_) => anyhow::bail!("Timeout waiting for server to start"),
    }
}
