// Amazon Cognito user-pool provider (USER_SRP_AUTH sign-in, REFRESH_TOKEN_AUTH renewal).
//
// Talks the `AWSCognitoIdentityProviderService` JSON protocol directly:
// POST to the regional endpoint with an `X-Amz-Target` header naming the
// action. The SRP arithmetic runs on the blocking pool so a sign-in never
// stalls other tasks on the runtime.

mod srp;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::{AuthContext, CredentialState, IdentityProvider};
use crate::discovery::UserPool;
use crate::error::{Error, body_preview};

use self::srp::{PasswordVerifier, SrpSession, srp_timestamp};

/// Region of the production MyHarvia user pool.
pub const DEFAULT_REGION: &str = "eu-west-1";

const AMZ_JSON: &str = "application/x-amz-json-1.1";
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";
const PASSWORD_VERIFIER: &str = "PASSWORD_VERIFIER";

// ── Wire shapes ──────────────────────────────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct InitiateAuthRequest<'a> {
    auth_flow: &'a str,
    client_id: &'a str,
    auth_parameters: HashMap<&'a str, String>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RespondToAuthChallengeRequest<'a> {
    challenge_name: &'a str,
    client_id: &'a str,
    challenge_responses: HashMap<&'a str, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthResponse {
    #[serde(default)]
    challenge_name: Option<String>,
    #[serde(default)]
    challenge_parameters: HashMap<String, String>,
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    authentication_result: Option<AuthenticationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AuthenticationResult {
    access_token: String,
    id_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    expires_in: i64,
}

#[derive(Deserialize)]
struct CognitoError {
    #[serde(rename = "__type", default)]
    kind: Option<String>,
    #[serde(default, alias = "Message")]
    message: Option<String>,
}

/// Exception types that mean the user, password or token was refused.
/// Throttling and service faults are not among them.
const CREDENTIAL_REJECTIONS: &[&str] = &[
    "NotAuthorizedException",
    "UserNotFoundException",
    "UserNotConfirmedException",
    "PasswordResetRequiredException",
    "InvalidPasswordException",
];

impl CognitoError {
    /// The bare exception name; AWS sometimes prefixes it with a namespace and `#`.
    fn exception(&self) -> Option<&str> {
        self.kind
            .as_deref()
            .map(|kind| kind.rsplit('#').next().unwrap_or(kind))
    }

    fn is_credential_rejection(&self) -> bool {
        self.exception()
            .is_some_and(|kind| CREDENTIAL_REJECTIONS.contains(&kind))
    }

    fn describe(&self) -> String {
        let kind = self.exception().unwrap_or("Cognito rejected the request");
        match &self.message {
            Some(msg) => format!("{kind}: {msg}"),
            None => kind.to_owned(),
        }
    }
}

impl AuthenticationResult {
    /// Build the triple; `fallback_refresh` covers renewals, which do not
    /// rotate the refresh token.
    fn into_state(self, fallback_refresh: Option<&SecretString>) -> Result<CredentialState, Error> {
        let refresh = match (self.refresh_token, fallback_refresh) {
            (Some(token), _) => SecretString::from(token),
            (None, Some(previous)) => previous.clone(),
            (None, None) => return Err(Error::missing("AuthenticationResult.RefreshToken")),
        };
        let expires_at = Utc::now() + TimeDelta::seconds(self.expires_in.max(0));
        Ok(CredentialState::new(
            SecretString::from(self.access_token),
            refresh,
            SecretString::from(self.id_token),
            expires_at,
        ))
    }
}

// ── Provider ─────────────────────────────────────────────────────────

/// [`IdentityProvider`] backed by an Amazon Cognito user pool.
#[derive(Debug, Clone)]
pub struct CognitoProvider {
    region: String,
    endpoint: Option<Url>,
}

impl Default for CognitoProvider {
    fn default() -> Self {
        Self::new(DEFAULT_REGION)
    }
}

impl CognitoProvider {
    /// `region` is used when the pool id carries no region prefix.
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            endpoint: None,
        }
    }

    /// Send requests to a fixed endpoint instead of `cognito-idp.{region}.amazonaws.com`.
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    fn endpoint_for(&self, pool: &UserPool) -> Result<Url, Error> {
        if let Some(ref endpoint) = self.endpoint {
            return Ok(endpoint.clone());
        }
        let region = pool.region().unwrap_or(&self.region);
        Ok(Url::parse(&format!(
            "https://cognito-idp.{region}.amazonaws.com/"
        ))?)
    }

    async fn call<B, T>(&self, ctx: AuthContext<'_>, action: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint_for(ctx.pool)?;
        debug!(action, "POST {url}");

        let resp = ctx
            .http
            .post(url.clone())
            .header(reqwest::header::CONTENT_TYPE, AMZ_JSON)
            .header("X-Amz-Target", format!("{TARGET_PREFIX}.{action}"))
            .body(serde_json::to_vec(body).map_err(|e| Error::Deserialization {
                message: format!("failed to encode {action} request: {e}"),
                body: String::new(),
            })?)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let rejection = serde_json::from_str::<CognitoError>(&body).ok();
            if let Some(err) = rejection
                .filter(|err| status.is_client_error() && err.is_credential_rejection())
            {
                return Err(Error::Authentication {
                    message: err.describe(),
                });
            }
            return Err(Error::Http {
                status: status.as_u16(),
                url: url.to_string(),
                body: body_preview(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{action}: {e}"),
            body,
        })
    }
}

#[async_trait]
impl IdentityProvider for CognitoProvider {
    async fn sign_in(
        &self,
        ctx: AuthContext<'_>,
        username: &str,
        password: &SecretString,
    ) -> Result<CredentialState, Error> {
        let pool_name = ctx.pool.pool_name()?.to_owned();

        let srp = tokio::task::spawn_blocking(SrpSession::generate)
            .await
            .map_err(|e| Error::Authentication {
                message: format!("SRP setup task failed: {e}"),
            })?;

        let request = InitiateAuthRequest {
            auth_flow: "USER_SRP_AUTH",
            client_id: &ctx.pool.client_id,
            auth_parameters: HashMap::from([
                ("USERNAME", username.to_owned()),
                ("SRP_A", srp.public_a_hex()),
            ]),
        };
        let challenge: AuthResponse = self.call(ctx, "InitiateAuth", &request).await?;

        match challenge.challenge_name.as_deref() {
            Some(PASSWORD_VERIFIER) => {}
            Some(other) => {
                return Err(Error::ChallengeUnsupported {
                    challenge: other.to_owned(),
                });
            }
            None => {
                return Err(Error::missing("ChallengeName"));
            }
        }

        let param = |name: &str| {
            challenge
                .challenge_parameters
                .get(name)
                .cloned()
                .ok_or_else(|| Error::missing(format!("ChallengeParameters.{name}")))
        };
        let user_id = param("USER_ID_FOR_SRP")?;
        let salt = param("SALT")?;
        let srp_b = param("SRP_B")?;
        let secret_block = param("SECRET_BLOCK")?;
        let timestamp = srp_timestamp(Utc::now());

        let signature = {
            let password = password.clone();
            let (user_id, secret_block, timestamp) =
                (user_id.clone(), secret_block.clone(), timestamp.clone());
            tokio::task::spawn_blocking(move || {
                srp.password_claim(
                    &PasswordVerifier {
                        pool_name: &pool_name,
                        user_id_for_srp: &user_id,
                        salt_hex: &salt,
                        srp_b_hex: &srp_b,
                        secret_block: &secret_block,
                        timestamp: &timestamp,
                    },
                    password.expose_secret(),
                )
            })
            .await
            .map_err(|e| Error::Authentication {
                message: format!("SRP claim task failed: {e}"),
            })??
        };

        let response = RespondToAuthChallengeRequest {
            challenge_name: PASSWORD_VERIFIER,
            client_id: &ctx.pool.client_id,
            challenge_responses: HashMap::from([
                ("USERNAME", user_id),
                ("TIMESTAMP", timestamp),
                ("PASSWORD_CLAIM_SECRET_BLOCK", secret_block),
                ("PASSWORD_CLAIM_SIGNATURE", signature),
            ]),
            session: challenge.session.clone(),
        };
        let result: AuthResponse = self
            .call(ctx, "RespondToAuthChallenge", &response)
            .await?;

        if let Some(next) = result.challenge_name {
            return Err(Error::ChallengeUnsupported { challenge: next });
        }
        result
            .authentication_result
            .ok_or_else(|| Error::missing("AuthenticationResult"))?
            .into_state(None)
    }

    async fn renew(
        &self,
        ctx: AuthContext<'_>,
        current: &CredentialState,
    ) -> Result<CredentialState, Error> {
        let request = InitiateAuthRequest {
            auth_flow: "REFRESH_TOKEN_AUTH",
            client_id: &ctx.pool.client_id,
            auth_parameters: HashMap::from([(
                "REFRESH_TOKEN",
                current.refresh_token().expose_secret().to_owned(),
            )]),
        };
        let result: AuthResponse = self.call(ctx, "InitiateAuth", &request).await?;
        result
            .authentication_result
            .ok_or_else(|| Error::missing("AuthenticationResult"))?
            .into_state(Some(current.refresh_token()))
    }
}
