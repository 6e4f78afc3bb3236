//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use harvia_config::ConfigError;
use harvia_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the MyHarvia cloud")]
    #[diagnostic(
        code(harvia::connection_failed),
        help(
            "{reason}\n\
             Check your network connection, or the discovery_url of your profile."
        )
    )]
    ConnectionFailed { reason: String },

    #[error("Session is not connected: {message}")]
    #[diagnostic(code(harvia::not_connected))]
    NotConnected { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(harvia::auth_failed),
        help(
            "Verify the e-mail and password you use in the MyHarvia app.\n\
             Run: harvia config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("No credentials configured for profile '{profile}'")]
    #[diagnostic(
        code(harvia::no_credentials),
        help(
            "Configure credentials with: harvia config init\n\
             Or set the HARVIA_USERNAME and HARVIA_PASSWORD environment variables."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("No sauna devices found on this account")]
    #[diagnostic(
        code(harvia::no_devices),
        help("Pair the sauna in the MyHarvia app first.")
    )]
    NoDevices,

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Unexpected response from the MyHarvia cloud: {message}")]
    #[diagnostic(code(harvia::malformed_response), help("Re-run with -vv for request details."))]
    MalformedResponse { message: String },

    #[error("{message}")]
    #[diagnostic(code(harvia::action_failed))]
    ActionFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(harvia::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(harvia::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: harvia config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(harvia::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NoDevices | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { reason } => CliError::ConnectionFailed { reason },
            CoreError::AuthenticationFailed { message } => CliError::AuthFailed { message },
            CoreError::NotConnected { message } => CliError::NotConnected { message },
            CoreError::MalformedResponse { message } => CliError::MalformedResponse { message },
            CoreError::NoDevices => CliError::NoDevices,
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::ProfileNotFound { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
