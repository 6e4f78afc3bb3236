use thiserror::Error;

use crate::discovery::Service;

/// Top-level error type for the `harvia-api` crate.
///
/// Covers every failure mode of the client: session lifecycle, endpoint
/// discovery, Cognito authentication, GraphQL transport, and payload decoding.
/// `harvia-core` maps these into the user-facing taxonomy.
#[derive(Debug, Error)]
pub enum Error {
    // ── Usage ───────────────────────────────────────────────────────
    /// A network operation was attempted before `open()` or after `close()`.
    #[error("HTTP session is not open")]
    SessionClosed,

    /// A privileged call was attempted before endpoint discovery ran.
    #[error("Endpoint directory has not been discovered yet")]
    NotDiscovered,

    // ── Connectivity ────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    /// One of the discovery calls failed; the whole directory is discarded.
    #[error("Endpoint discovery failed for '{service}': {reason}")]
    Discovery { service: Service, reason: String },

    /// The endpoint directory has no usable entry for a service.
    #[error("No endpoint registered for service '{service}'")]
    MissingEndpoint { service: Service },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Authentication ──────────────────────────────────────────────
    /// Sign-in or renewal was rejected (wrong credentials, revoked token, etc.)
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    /// Cognito asked for a challenge this client cannot answer.
    #[error("Unsupported authentication challenge: {challenge}")]
    ChallengeUnsupported { challenge: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// An expected field is missing from a response.
    #[error("Response is missing field '{field}'")]
    MissingField { field: String },

    /// A string-valued field that should carry JSON could not be decoded.
    #[error("Field '{field}' does not contain valid JSON: {source}")]
    EmbeddedJson {
        field: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns `true` for failures reaching or talking to the backend.
    pub fn is_connectivity(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::Http { .. } | Self::Discovery { .. }
        )
    }

    /// Returns `true` if the identity provider rejected the exchange.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::Authentication { .. } | Self::ChallengeUnsupported { .. }
        )
    }

    /// Returns `true` if a response arrived but did not have the expected shape.
    pub fn is_malformed_response(&self) -> bool {
        matches!(
            self,
            Self::Deserialization { .. } | Self::MissingField { .. } | Self::EmbeddedJson { .. }
        )
    }

    /// Returns `true` if the caller used the client outside its open lifetime.
    pub fn is_usage(&self) -> bool {
        matches!(self, Self::SessionClosed | Self::NotDiscovered)
    }

    pub(crate) fn missing(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }
}

/// Truncate a response body for inclusion in error messages.
pub(crate) fn body_preview(body: &str) -> String {
    body.chars().take(200).collect()
}
