// ── Controller abstraction ──
//
// Lifecycle and device operations for one MyHarvia account. Wraps the
// GraphQL client, walks the device tree, and merges reported state with
// telemetry into `DeviceRecord`s.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use harvia_api::graphql::{self, GraphqlOperation};
use harvia_api::{CognitoProvider, HarviaClient, IdentityProvider, Service};

use crate::config::{ControllerConfig, ListingPolicy};
use crate::error::CoreError;
use crate::model::tree;
use crate::model::{DeviceListing, DeviceRecord, SkippedDevice};
use crate::queries;

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Calls are valid between
/// [`connect()`](Self::connect) and [`close()`](Self::close); the first
/// device call signs in.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: ControllerConfig,
    client: HarviaClient,
}

impl Controller {
    /// Create a controller that signs in through Cognito. Does NOT connect.
    pub fn new(config: ControllerConfig) -> Self {
        let mut provider = CognitoProvider::new(config.region.clone());
        if let Some(ref endpoint) = config.cognito_endpoint {
            provider = provider.with_endpoint(endpoint.clone());
        }
        Self::with_provider(config, Arc::new(provider))
    }

    /// Create a controller with a custom identity provider.
    pub fn with_provider(config: ControllerConfig, provider: Arc<dyn IdentityProvider>) -> Self {
        let client = HarviaClient::new(config.client_config(), provider);
        Self {
            inner: Arc::new(ControllerInner { config, client }),
        }
    }

    /// Access the controller configuration.
    pub fn config(&self) -> &ControllerConfig {
        &self.inner.config
    }

    // ── Connection lifecycle ─────────────────────────────────────

    /// Open the session and discover the service endpoints.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.client.connect().await?;
        Ok(())
    }

    /// Sign in now instead of on the first device call.
    pub async fn authenticate(&self) -> Result<(), CoreError> {
        self.inner.client.authenticate().await?;
        Ok(())
    }

    /// Drop the tokens and release the session. Idempotent.
    pub async fn close(&self) {
        self.inner.client.close().await;
        info!("disconnected from MyHarvia backend");
    }

    /// Connect, run `f`, and close again whether `f` succeeded or not.
    pub async fn scoped<F, Fut, T>(config: ControllerConfig, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        Self::new(config).run_scoped(f).await
    }

    /// [`scoped`](Self::scoped) for an already-built controller.
    pub async fn run_scoped<F, Fut, T>(self, f: F) -> Result<T, CoreError>
    where
        F: FnOnce(Controller) -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        if let Err(e) = self.connect().await {
            self.close().await;
            return Err(e);
        }
        let result = f(self.clone()).await;
        self.close().await;
        result
    }

    // ── Device operations ────────────────────────────────────────

    /// Every device on the account, fetched one at a time in tree order.
    ///
    /// Under [`ListingPolicy::FailFast`] the first failing device aborts
    /// the listing; under `SkipFailed` it is left out.
    pub async fn list_devices(&self) -> Result<Vec<DeviceRecord>, CoreError> {
        Ok(self.device_listing().await?.devices)
    }

    /// Like [`list_devices`](Self::list_devices), also reporting skipped devices.
    pub async fn device_listing(&self) -> Result<DeviceListing, CoreError> {
        let mut listing = DeviceListing::default();
        for device_id in self.device_ids().await? {
            match self.get_device(&device_id).await {
                Ok(record) => listing.devices.push(record),
                Err(e) if self.inner.config.listing_policy == ListingPolicy::SkipFailed => {
                    warn!(device_id = %device_id, error = %e, "skipping device");
                    listing.skipped.push(SkippedDevice {
                        device_id,
                        error: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }
        debug!(
            devices = listing.devices.len(),
            skipped = listing.skipped.len(),
            "device listing complete"
        );
        Ok(listing)
    }

    /// Device ids from the device tree, without fetching any state.
    pub async fn device_ids(&self) -> Result<Vec<String>, CoreError> {
        let envelope = self.execute(queries::device_tree()).await?;
        let raw = data_field(&envelope, &["data", "getDeviceTree"])?;
        let tree = graphql::embedded_json(raw, "getDeviceTree")?;
        tree::device_ids(tree)
    }

    /// Reported state merged with the latest telemetry.
    pub async fn get_device(&self, device_id: &str) -> Result<DeviceRecord, CoreError> {
        let reported = self.get_device_state(device_id).await?;
        let telemetry = self.get_latest_data(device_id).await?;
        DeviceRecord::merge(device_id, reported, telemetry)
    }

    /// The decoded `reported` document of `getDeviceState`.
    pub async fn get_device_state(&self, device_id: &str) -> Result<Map<String, Value>, CoreError> {
        let envelope = self.execute(queries::device_state(device_id)).await?;
        let reported = data_field(&envelope, &["data", "getDeviceState", "reported"])?;
        Ok(graphql::embedded_object(reported, "reported")?)
    }

    /// The decoded `data` document of `getLatestData`, with the sample's
    /// `timestamp` and `type` written over any same-named keys.
    pub async fn get_latest_data(&self, device_id: &str) -> Result<Map<String, Value>, CoreError> {
        let envelope = self.execute(queries::latest_data(device_id)).await?;
        let item = data_field(&envelope, &["data", "getLatestData"])?;
        let mut data = graphql::embedded_object(data_field(item, &["data"])?, "data")?;
        for key in ["timestamp", "type"] {
            let value = item.get(key).ok_or_else(|| {
                CoreError::malformed(format!("getLatestData response has no '{key}'"))
            })?;
            data.insert(key.to_owned(), value.clone());
        }
        Ok(data)
    }

    /// Ask the backend to apply `desired`. Returns the raw mutation response
    /// without waiting for the device to act on it.
    pub async fn send_state_change(
        &self,
        device_id: &str,
        desired: &Map<String, Value>,
    ) -> Result<Value, CoreError> {
        debug!(device_id, ?desired, "requesting state change");
        self.execute(queries::state_change(device_id, desired)).await
    }

    async fn execute(&self, (service, operation): (Service, GraphqlOperation)) -> Result<Value, CoreError> {
        Ok(self.inner.client.execute(service, &operation).await?)
    }
}

/// Walk to `path`, explaining a miss with the envelope's GraphQL errors.
fn data_field<'a>(envelope: &'a Value, path: &[&str]) -> Result<&'a Value, CoreError> {
    graphql::field(envelope, path).map_err(|e| match graphql::errors(envelope) {
        Some(errors) if !errors.is_empty() => {
            let messages: Vec<&str> = errors
                .iter()
                .map(|err| err.get("message").and_then(Value::as_str).unwrap_or("unknown error"))
                .collect();
            CoreError::malformed(format!(
                "{} missing; backend reported: {}",
                path.join("."),
                messages.join("; ")
            ))
        }
        _ => CoreError::from(e),
    })
}
