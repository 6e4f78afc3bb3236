// Endpoint directory: the four backend services resolved once at startup.
//
// Discovery issues `GET {base}/{service}/endpoint` for every service and
// keeps the decoded descriptors. Any single failure discards the whole
// directory; there is no partially-populated state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use tracing::debug;
use url::Url;

use crate::error::{Error, body_preview};

/// Production discovery host.
pub const DEFAULT_DISCOVERY_URL: &str = "https://prod.myharvia-cloud.net";

/// A named backend service.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Service {
    /// User-pool / identity configuration.
    Users,
    /// Device tree, state, and commands.
    Device,
    /// Event history.
    Events,
    /// Telemetry samples.
    Data,
}

/// One entry of the directory as returned by the discovery call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDescriptor {
    pub endpoint: Url,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_pool_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_pool_id: Option<String>,
    /// Anything else the backend sends along.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Cognito user-pool identifiers taken from the `users` descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserPool {
    pub user_pool_id: String,
    pub client_id: String,
    pub identity_pool_id: Option<String>,
}

impl UserPool {
    /// The AWS region prefix of the pool id (`eu-west-1_AbC` -> `eu-west-1`).
    pub fn region(&self) -> Option<&str> {
        self.user_pool_id
            .split_once('_')
            .map(|(region, _)| region)
            .filter(|region| !region.is_empty())
    }

    /// The pool name without its region prefix (`eu-west-1_AbC` -> `AbC`).
    pub fn pool_name(&self) -> Result<&str, Error> {
        self.user_pool_id
            .split_once('_')
            .map(|(_, name)| name)
            .filter(|name| !name.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: format!("malformed user pool id '{}'", self.user_pool_id),
            })
    }
}

/// Immutable mapping from [`Service`] to its [`EndpointDescriptor`].
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointDirectory {
    entries: HashMap<Service, EndpointDescriptor>,
}

impl EndpointDirectory {
    /// Resolve every service from the discovery host.
    pub async fn discover(http: &reqwest::Client, base: &Url) -> Result<Self, Error> {
        let mut entries = HashMap::new();
        for service in Service::iter() {
            let descriptor = fetch_descriptor(http, base, service).await?;
            debug!(%service, endpoint = %descriptor.endpoint, "discovered endpoint");
            entries.insert(service, descriptor);
        }
        Self::from_entries(entries)
    }

    /// Build a directory from pre-resolved descriptors. Every service must be present.
    pub fn from_entries(
        entries: impl IntoIterator<Item = (Service, EndpointDescriptor)>,
    ) -> Result<Self, Error> {
        let entries: HashMap<_, _> = entries.into_iter().collect();
        if let Some(service) = Service::iter().find(|s| !entries.contains_key(s)) {
            return Err(Error::MissingEndpoint { service });
        }
        Ok(Self { entries })
    }

    pub fn get(&self, service: Service) -> Result<&EndpointDescriptor, Error> {
        self.entries
            .get(&service)
            .ok_or(Error::MissingEndpoint { service })
    }

    /// The GraphQL endpoint URL of a service.
    pub fn endpoint(&self, service: Service) -> Result<&Url, Error> {
        self.get(service).map(|d| &d.endpoint)
    }

    /// Cognito identifiers from the `users` descriptor.
    pub fn user_pool(&self) -> Result<UserPool, Error> {
        let users = self.get(Service::Users)?;
        let user_pool_id = users
            .user_pool_id
            .clone()
            .ok_or_else(|| Error::missing("users.userPoolId"))?;
        let client_id = users
            .client_id
            .clone()
            .ok_or_else(|| Error::missing("users.clientId"))?;
        Ok(UserPool {
            user_pool_id,
            client_id,
            identity_pool_id: users.identity_pool_id.clone(),
        })
    }
}

/// Build `{base}/{service}/endpoint`.
pub fn discovery_url(base: &Url, service: Service) -> Result<Url, Error> {
    let base = base.as_str().trim_end_matches('/');
    Ok(Url::parse(&format!("{base}/{service}/endpoint"))?)
}

async fn fetch_descriptor(
    http: &reqwest::Client,
    base: &Url,
    service: Service,
) -> Result<EndpointDescriptor, Error> {
    let url = discovery_url(base, service)?;
    debug!("GET {url}");

    let resp = http.get(url).send().await.map_err(|e| Error::Discovery {
        service,
        reason: e.to_string(),
    })?;

    let status = resp.status();
    let body = resp.text().await.map_err(|e| Error::Discovery {
        service,
        reason: e.to_string(),
    })?;

    if !status.is_success() {
        return Err(Error::Discovery {
            service,
            reason: format!("HTTP {status}: {}", body_preview(&body)),
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Discovery {
        service,
        reason: format!("{e} (body preview: {:?})", body_preview(&body)),
    })
}
