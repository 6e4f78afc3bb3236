// MyHarvia cloud client
//
// Ties the session resource, endpoint directory, and credential manager
// together behind a single GraphQL entry point. Lifecycle:
// `open()` -> `discover()` (or `connect()` for both) -> `execute()`... -> `close()`.
// The first privileged call signs in lazily.

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::auth::{
    AuthContext, CredentialManager, DEFAULT_REFRESH_SKEW, IdentityProvider, authorization_value,
};
use crate::discovery::{DEFAULT_DISCOVERY_URL, EndpointDirectory, Service, UserPool};
use crate::error::{Error, body_preview};
use crate::graphql::GraphqlOperation;
use crate::transport::{Session, TransportConfig};

/// Everything needed to build a [`HarviaClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Discovery host; `{discovery_url}/{service}/endpoint` is queried per service.
    pub discovery_url: Url,
    pub username: String,
    pub password: SecretString,
    pub transport: TransportConfig,
    /// Renew tokens this long before the identity token expires.
    pub refresh_skew: Duration,
}

impl ClientConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Result<Self, Error> {
        Ok(Self {
            discovery_url: Url::parse(DEFAULT_DISCOVERY_URL)?,
            username: username.into(),
            password,
            transport: TransportConfig::default(),
            refresh_skew: DEFAULT_REFRESH_SKEW,
        })
    }
}

/// Async client for the MyHarvia GraphQL backend.
///
/// One credential pair per instance. Not `Clone`; share it behind an `Arc`.
#[derive(Debug)]
pub struct HarviaClient {
    discovery_url: Url,
    session: Session,
    endpoints: RwLock<Option<Arc<EndpointDirectory>>>,
    credentials: CredentialManager,
}

impl HarviaClient {
    pub fn new(config: ClientConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let credentials = CredentialManager::new(config.username, config.password, provider)
            .with_refresh_skew(config.refresh_skew);
        Self {
            discovery_url: config.discovery_url,
            session: Session::new(config.transport),
            endpoints: RwLock::new(None),
            credentials,
        }
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Open the HTTP session.
    pub async fn open(&self) -> Result<(), Error> {
        self.session.open().await
    }

    /// Open the session and populate the endpoint directory.
    ///
    /// If discovery fails the session is closed again before returning.
    pub async fn connect(&self) -> Result<(), Error> {
        self.open().await?;
        if let Err(e) = self.discover().await {
            self.close().await;
            return Err(e);
        }
        info!(url = %self.discovery_url, "connected to MyHarvia backend");
        Ok(())
    }

    /// Resolve every service endpoint. Runs once; later calls reuse the directory.
    pub async fn discover(&self) -> Result<Arc<EndpointDirectory>, Error> {
        let mut guard = self.endpoints.write().await;
        if let Some(ref directory) = *guard {
            return Ok(Arc::clone(directory));
        }
        let http = self.session.http().await?;
        let directory = Arc::new(EndpointDirectory::discover(&http, &self.discovery_url).await?);
        *guard = Some(Arc::clone(&directory));
        Ok(directory)
    }

    /// Release the session and forget the tokens. Safe to call repeatedly.
    pub async fn close(&self) {
        self.credentials.clear().await;
        self.session.close().await;
    }

    pub async fn is_open(&self) -> bool {
        self.session.is_open().await
    }

    /// The discovered directory.
    pub async fn endpoints(&self) -> Result<Arc<EndpointDirectory>, Error> {
        self.endpoints
            .read()
            .await
            .clone()
            .ok_or(Error::NotDiscovered)
    }

    pub fn credentials(&self) -> &CredentialManager {
        &self.credentials
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Sign in now rather than on the first privileged call.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let (http, pool) = self.auth_inputs().await?;
        self.credentials
            .authenticate(AuthContext {
                http: &http,
                pool: &pool,
            })
            .await
    }

    /// A currently valid identity token, signing in or renewing as needed.
    pub async fn ensure_fresh_token(&self) -> Result<SecretString, Error> {
        let (http, pool) = self.auth_inputs().await?;
        self.credentials
            .ensure_fresh_token(AuthContext {
                http: &http,
                pool: &pool,
            })
            .await
    }

    async fn auth_inputs(&self) -> Result<(reqwest::Client, UserPool), Error> {
        let http = self.session.http().await?;
        let pool = self.endpoints().await?.user_pool()?;
        Ok((http, pool))
    }

    // ── GraphQL gateway ──────────────────────────────────────────────

    /// POST a GraphQL operation to a service and return the decoded envelope.
    ///
    /// GraphQL-level `errors` are not interpreted; only HTTP failures and
    /// undecodable bodies are errors here.
    pub async fn execute(
        &self,
        service: Service,
        operation: &GraphqlOperation,
    ) -> Result<Value, Error> {
        let http = self.session.http().await?;
        let token = self.ensure_fresh_token().await?;
        let url = self.endpoints().await?.endpoint(service)?.clone();

        debug!(%service, operation = %operation.operation_name, "POST {url}");

        let resp = http
            .post(url.clone())
            .header(reqwest::header::AUTHORIZATION, authorization_value(&token)?)
            .json(operation)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: body_preview(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", body_preview(&body)),
            body,
        })
    }
}
