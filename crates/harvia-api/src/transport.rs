// Session resource: the single pooled HTTP client shared by discovery,
// authentication, and GraphQL calls.
//
// The client only exists between `open()` and `close()`. Every network
// operation goes through `Session::http()`, which fails with
// `Error::SessionClosed` outside that window.

use std::time::Duration;

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Error;

const USER_AGENT: &str = concat!("harvly/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building the HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.into(),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(Error::Transport)
    }
}

/// Owner of the pooled HTTP connection context.
///
/// `close()` is idempotent: closing twice, or closing a session that was
/// never opened, is a no-op.
#[derive(Debug)]
pub struct Session {
    transport: TransportConfig,
    http: RwLock<Option<reqwest::Client>>,
}

impl Session {
    pub fn new(transport: TransportConfig) -> Self {
        Self {
            transport,
            http: RwLock::new(None),
        }
    }

    /// Create the HTTP client. Re-opening an open session keeps the
    /// existing connection pool.
    pub async fn open(&self) -> Result<(), Error> {
        let mut guard = self.http.write().await;
        if guard.is_none() {
            *guard = Some(self.transport.build_client()?);
            debug!(timeout = ?self.transport.timeout, "HTTP session opened");
        }
        Ok(())
    }

    /// Release the HTTP client and its pooled connections.
    pub async fn close(&self) {
        if self.http.write().await.take().is_some() {
            debug!("HTTP session closed");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.http.read().await.is_some()
    }

    /// A handle to the open client (cheap `Arc` clone).
    pub async fn http(&self) -> Result<reqwest::Client, Error> {
        self.http.read().await.clone().ok_or(Error::SessionClosed)
    }
}
