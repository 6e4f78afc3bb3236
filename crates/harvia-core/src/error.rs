// ── Core error types ──
//
// User-facing errors from harvia-core. Consumers never see HTTP status
// codes or serde failures directly. The `From<harvia_api::Error>` impl folds
// transport-layer errors into the four kinds callers discriminate on:
// connectivity, authentication, malformed response, and validation.

use thiserror::Error;

/// Coarse classification of a [`CoreError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    Connectivity,
    Authentication,
    MalformedResponse,
    Validation,
    /// The controller was used outside its connected lifetime.
    Usage,
    NotFound,
    Config,
}

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach MyHarvia backend: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Not connected: {message}")]
    NotConnected { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    #[error("No sauna devices found on this account")]
    NoDevices,

    // ── Operation errors ─────────────────────────────────────────────
    #[error("{message}")]
    ValidationFailed { message: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ConnectionFailed { .. } => ErrorKind::Connectivity,
            Self::AuthenticationFailed { .. } => ErrorKind::Authentication,
            Self::NotConnected { .. } => ErrorKind::Usage,
            Self::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            Self::NoDevices => ErrorKind::NotFound,
            Self::ValidationFailed { .. } => ErrorKind::Validation,
            Self::Config { .. } => ErrorKind::Config,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<harvia_api::Error> for CoreError {
    fn from(err: harvia_api::Error) -> Self {
        use harvia_api::Error as Api;

        match err {
            Api::SessionClosed | Api::NotDiscovered => CoreError::NotConnected {
                message: err.to_string(),
            },
            Api::Transport(ref e) => CoreError::ConnectionFailed {
                reason: e.to_string(),
            },
            Api::Http { .. } | Api::Discovery { .. } | Api::MissingEndpoint { .. } => {
                CoreError::ConnectionFailed {
                    reason: err.to_string(),
                }
            }
            Api::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Authentication { message } => CoreError::AuthenticationFailed { message },
            Api::ChallengeUnsupported { .. } => CoreError::AuthenticationFailed {
                message: err.to_string(),
            },
            Api::Deserialization { .. } | Api::MissingField { .. } | Api::EmbeddedJson { .. } => {
                CoreError::MalformedResponse {
                    message: err.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_fold_into_taxonomy() {
        let http = CoreError::from(harvia_api::Error::Http {
            status: 503,
            url: "https://example.invalid/graphql".into(),
            body: String::new(),
        });
        assert_eq!(http.kind(), ErrorKind::Connectivity);

        let missing = CoreError::from(harvia_api::Error::MissingField {
            field: "data.getDeviceState.reported".into(),
        });
        assert_eq!(missing.kind(), ErrorKind::MalformedResponse);
        assert!(missing.to_string().contains("data.getDeviceState.reported"));

        let auth = CoreError::from(harvia_api::Error::ChallengeUnsupported {
            challenge: "SMS_MFA".into(),
        });
        assert_eq!(auth.kind(), ErrorKind::Authentication);

        let closed = CoreError::from(harvia_api::Error::SessionClosed);
        assert_eq!(closed.kind(), ErrorKind::Usage);
    }

    #[test]
    fn validation_message_is_verbatim() {
        let err = CoreError::ValidationFailed {
            message: "Humidity must be between 0% and 140%".into(),
        };
        assert_eq!(err.to_string(), "Humidity must be between 0% and 140%");
    }
}
