//! Shared configuration for harvly.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! and translation to `harvia_core::ControllerConfig`. Core never reads
//! these types; it receives a pre-built `ControllerConfig`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use harvia_core::{ControllerConfig, ListingPolicy};

/// Keyring service name for stored passwords.
pub const KEYRING_SERVICE: &str = "harvly";

/// Environment variable that points at an alternative config file.
pub const CONFIG_ENV: &str = "HARVIA_CONFIG";
pub const USERNAME_ENV: &str = "HARVIA_USERNAME";
pub const PASSWORD_ENV: &str = "HARVIA_PASSWORD";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found in config")]
    ProfileNotFound { name: String },

    #[error("keyring error: {0}")]
    Keyring(String),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named account profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub listing_policy: ListingPolicy,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            listing_policy: ListingPolicy::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named MyHarvia account profile.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Account e-mail.
    pub username: Option<String>,

    /// Password (plaintext -- prefer keyring or env var).
    pub password: Option<String>,

    /// Device to act on when `--device` is not given.
    pub device: Option<String>,

    /// Override the discovery host.
    pub discovery_url: Option<String>,

    /// Cognito region for pool ids without a region prefix.
    pub region: Option<String>,

    /// Fixed Cognito endpoint.
    pub cognito_endpoint: Option<String>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,

    /// Override the listing policy.
    pub listing_policy: Option<ListingPolicy>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `$HARVIA_CONFIG`, else the platform
/// config dir.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("net", "harvly", "harvly").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("harvly");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit path, layered as defaults < TOML < `HARVIA_*` env.
///
/// Nested keys use a double underscore: `HARVIA_DEFAULTS__TIMEOUT=60`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(
            Env::prefixed("HARVIA_")
                .ignore(&["CONFIG", "USERNAME", "PASSWORD"])
                .split("__"),
        );

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if it cannot be read.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Profiles ────────────────────────────────────────────────────────

impl Config {
    /// The profile to use: `requested`, else `default_profile`, else "default".
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// Look up a profile. A missing "default" profile is treated as empty so
    /// env-only setups work without a config file.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(profile) => Ok(profile.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::ProfileNotFound { name: name.into() }),
        }
    }
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolves the account credentials for a profile.
///
/// Username: `HARVIA_USERNAME`, then the profile. Password:
/// `HARVIA_PASSWORD`, then the system keyring, then the profile.
#[derive(Debug, Clone, Copy)]
pub struct CredentialResolver {
    env: fn(&str) -> Option<String>,
    keyring: bool,
}

impl Default for CredentialResolver {
    fn default() -> Self {
        Self {
            env: |key| std::env::var(key).ok().filter(|v| !v.is_empty()),
            keyring: true,
        }
    }
}

impl CredentialResolver {
    /// Use `env` instead of the process environment.
    pub fn with_env(mut self, env: fn(&str) -> Option<String>) -> Self {
        self.env = env;
        self
    }

    /// Skip the system keyring.
    pub fn without_keyring(mut self) -> Self {
        self.keyring = false;
        self
    }

    pub fn resolve(
        &self,
        profile: &Profile,
        profile_name: &str,
    ) -> Result<(String, SecretString), ConfigError> {
        let missing = || ConfigError::NoCredentials {
            profile: profile_name.into(),
        };

        let username = (self.env)(USERNAME_ENV)
            .or_else(|| profile.username.clone())
            .filter(|u| !u.is_empty())
            .ok_or_else(missing)?;

        // 1. Env var
        if let Some(pw) = (self.env)(PASSWORD_ENV) {
            return Ok((username, SecretString::from(pw)));
        }

        // 2. Keyring
        if let Some(pw) = self.keyring.then(|| keyring_password(profile_name)).flatten() {
            return Ok((username, SecretString::from(pw)));
        }

        // 3. Plaintext in config
        if let Some(ref pw) = profile.password {
            return Ok((username, SecretString::from(pw.clone())));
        }

        Err(missing())
    }
}

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/password"))
}

fn keyring_password(profile_name: &str) -> Option<String> {
    keyring_entry(profile_name).ok()?.get_password().ok()
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)
        .and_then(|entry| entry.set_password(password))
        .map_err(|e| ConfigError::Keyring(e.to_string()))
}

// ── Translation to ControllerConfig ─────────────────────────────────

/// Build a `ControllerConfig` from a profile and the global defaults.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    credentials: &CredentialResolver,
) -> Result<ControllerConfig, ConfigError> {
    let (username, password) = credentials.resolve(profile, profile_name)?;

    let mut config =
        ControllerConfig::new(username, password).map_err(|e| ConfigError::Validation {
            field: "discovery_url".into(),
            reason: e.to_string(),
        })?;

    if let Some(ref raw) = profile.discovery_url {
        config.discovery_url = parse_url("discovery_url", raw)?;
    }
    if let Some(ref raw) = profile.cognito_endpoint {
        config.cognito_endpoint = Some(parse_url("cognito_endpoint", raw)?);
    }
    if let Some(ref region) = profile.region {
        config.region.clone_from(region);
    }
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.listing_policy = profile.listing_policy.unwrap_or(defaults.listing_policy);

    Ok(config)
}

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|_| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL: {raw}"),
    })
}
