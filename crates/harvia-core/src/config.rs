// ── Runtime connection configuration ──
//
// These types describe *how* to reach the MyHarvia backend and whose
// account to use. They carry credential data and tuning, but never touch
// disk. The CLI constructs a `ControllerConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use url::Url;

use harvia_api::auth::DEFAULT_REFRESH_SKEW;
use harvia_api::cognito::DEFAULT_REGION;
use harvia_api::discovery::DEFAULT_DISCOVERY_URL;
use harvia_api::{ClientConfig, TransportConfig};

use crate::error::CoreError;

/// What to do when one device in a listing cannot be read.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum ListingPolicy {
    /// Abort the whole listing on the first failed device.
    #[default]
    FailFast,
    /// Leave failed devices out and report them next to the listing.
    SkipFailed,
}

/// Configuration for one account session.
///
/// Built by the CLI, passed to `Controller` -- core never reads config files.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Discovery host (`{discovery_url}/{service}/endpoint`).
    pub discovery_url: Url,
    pub username: String,
    pub password: SecretString,
    /// Cognito region used when the user-pool id carries no region prefix.
    pub region: String,
    /// Fixed Cognito endpoint, for proxies and tests.
    pub cognito_endpoint: Option<Url>,
    /// Request timeout.
    pub timeout: Duration,
    /// Renew tokens this long before the identity token expires.
    pub refresh_skew: Duration,
    pub listing_policy: ListingPolicy,
}

impl ControllerConfig {
    pub fn new(username: impl Into<String>, password: SecretString) -> Result<Self, CoreError> {
        let discovery_url = Url::parse(DEFAULT_DISCOVERY_URL).map_err(|e| CoreError::Config {
            message: format!("invalid discovery URL: {e}"),
        })?;
        Ok(Self {
            discovery_url,
            username: username.into(),
            password,
            region: DEFAULT_REGION.into(),
            cognito_endpoint: None,
            timeout: Duration::from_secs(30),
            refresh_skew: DEFAULT_REFRESH_SKEW,
            listing_policy: ListingPolicy::default(),
        })
    }

    /// The transport-level view of this configuration.
    pub(crate) fn client_config(&self) -> ClientConfig {
        ClientConfig {
            discovery_url: self.discovery_url.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            transport: TransportConfig {
                timeout: self.timeout,
                ..TransportConfig::default()
            },
            refresh_skew: self.refresh_skew,
        }
    }
}
