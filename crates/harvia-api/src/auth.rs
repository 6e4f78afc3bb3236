// Credential manager: holds the current token triple and keeps it fresh.
//
// The concrete federated sign-in lives behind `IdentityProvider`, so the
// gateway and the device adapter never see Cognito specifics. State is held
// in a `tokio::sync::Mutex` across the whole sign-in / renewal exchange:
// concurrent callers queue behind a single in-flight exchange instead of
// racing redundant ones.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;
use tracing::debug;

use crate::discovery::UserPool;
use crate::error::Error;

/// Default margin before expiry at which tokens are renewed.
pub const DEFAULT_REFRESH_SKEW: Duration = Duration::from_secs(60);

/// The access / refresh / identity token triple from one exchange.
///
/// Always replaced wholesale; never partially updated.
#[derive(Clone)]
pub struct CredentialState {
    access_token: SecretString,
    refresh_token: SecretString,
    id_token: SecretString,
    expires_at: DateTime<Utc>,
}

impl CredentialState {
    pub fn new(
        access_token: SecretString,
        refresh_token: SecretString,
        id_token: SecretString,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            id_token,
            expires_at,
        }
    }

    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// The token presented to the GraphQL endpoints.
    pub fn id_token(&self) -> &SecretString {
        &self.id_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the identity token is expired or expires within `skew` of `now`.
    pub fn expires_within(&self, skew: Duration, now: DateTime<Utc>) -> bool {
        let skew = TimeDelta::from_std(skew).unwrap_or(TimeDelta::MAX);
        now.checked_add_signed(skew)
            .is_none_or(|deadline| deadline >= self.expires_at)
    }
}

impl fmt::Debug for CredentialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialState")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("id_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What a provider needs besides the secrets: the shared HTTP client and the
/// user-pool identifiers from the `users` endpoint descriptor.
#[derive(Debug, Clone, Copy)]
pub struct AuthContext<'a> {
    pub http: &'a reqwest::Client,
    pub pool: &'a UserPool,
}

/// A federated-identity mechanism capable of signing in and renewing tokens.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Password sign-in. Returns a complete token triple.
    async fn sign_in(
        &self,
        ctx: AuthContext<'_>,
        username: &str,
        password: &SecretString,
    ) -> Result<CredentialState, Error>;

    /// Exchange the current refresh token for a new triple.
    async fn renew(
        &self,
        ctx: AuthContext<'_>,
        current: &CredentialState,
    ) -> Result<CredentialState, Error>;
}

/// Two-state machine (unauthenticated / authenticated) around an
/// [`IdentityProvider`].
pub struct CredentialManager {
    username: String,
    password: SecretString,
    provider: Arc<dyn IdentityProvider>,
    refresh_skew: Duration,
    state: Mutex<Option<CredentialState>>,
}

impl CredentialManager {
    pub fn new(
        username: impl Into<String>,
        password: SecretString,
        provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            username: username.into(),
            password,
            provider,
            refresh_skew: DEFAULT_REFRESH_SKEW,
            state: Mutex::new(None),
        }
    }

    pub fn with_refresh_skew(mut self, skew: Duration) -> Self {
        self.refresh_skew = skew;
        self
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Sign in unless already authenticated.
    pub async fn authenticate(&self, ctx: AuthContext<'_>) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        self.sign_in_locked(&mut state, ctx).await
    }

    /// Guarantee an authenticated state and a non-expiring identity token.
    ///
    /// Renews the whole triple when the identity token is within the refresh
    /// skew of expiry; otherwise returns the current token untouched.
    pub async fn ensure_fresh_token(&self, ctx: AuthContext<'_>) -> Result<SecretString, Error> {
        let mut state = self.state.lock().await;
        self.sign_in_locked(&mut state, ctx).await?;

        let Some(current) = state.as_ref() else {
            return Err(Error::Authentication {
                message: "sign-in produced no credentials".into(),
            });
        };

        if current.expires_within(self.refresh_skew, Utc::now()) {
            debug!(expires_at = %current.expires_at(), "renewing identity token");
            match self.provider.renew(ctx, current).await {
                Ok(renewed) => *state = Some(renewed),
                Err(e) => {
                    // A rejected refresh token cannot recover; the next call signs in again.
                    if e.is_authentication() {
                        *state = None;
                    }
                    return Err(e);
                }
            }
        }

        state
            .as_ref()
            .map(|s| s.id_token().clone())
            .ok_or_else(|| Error::Authentication {
                message: "credentials were discarded during renewal".into(),
            })
    }

    /// Drop the held tokens (client shutdown).
    pub async fn clear(&self) {
        if self.state.lock().await.take().is_some() {
            debug!("credentials discarded");
        }
    }

    async fn sign_in_locked(
        &self,
        state: &mut Option<CredentialState>,
        ctx: AuthContext<'_>,
    ) -> Result<(), Error> {
        if state.is_some() {
            return Ok(());
        }
        debug!(username = %self.username, pool = %ctx.pool.user_pool_id, "signing in");
        let credentials = self
            .provider
            .sign_in(ctx, &self.username, &self.password)
            .await?;
        debug!(expires_at = %credentials.expires_at(), "sign-in successful");
        *state = Some(credentials);
        Ok(())
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("username", &self.username)
            .field("refresh_skew", &self.refresh_skew)
            .finish_non_exhaustive()
    }
}

/// Raw header value for the identity token (the backend expects it unprefixed).
pub(crate) fn authorization_value(token: &SecretString) -> Result<reqwest::header::HeaderValue, Error> {
    let mut value = reqwest::header::HeaderValue::from_str(token.expose_secret()).map_err(|e| {
        Error::Authentication {
            message: format!("identity token is not a valid header value: {e}"),
        }
    })?;
    value.set_sensitive(true);
    Ok(value)
}
