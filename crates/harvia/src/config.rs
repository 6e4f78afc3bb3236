//! CLI configuration -- thin wrapper around `harvia_config` shared types.
//!
//! Re-exports the shared types and adds resolution that respects the
//! `GlobalOpts` flag overrides (--profile, --device, --timeout).

use std::time::Duration;

use harvia_config::CredentialResolver;
use harvia_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use harvia_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

/// Everything a sauna command needs before connecting.
pub struct Resolved {
    pub controller: ControllerConfig,
    /// Device from `--device` or the profile; `None` means "first device".
    pub device: Option<String>,
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.active_profile_name(global.profile.as_deref())
}

/// A profile by name, listing the available ones when it is missing.
pub fn find_profile(config: &Config, name: &str) -> Result<Profile, CliError> {
    config
        .profile(name)
        .map_err(|_| profile_not_found(config, name))
}

pub fn profile_not_found(config: &Config, name: &str) -> CliError {
    let mut available: Vec<_> = config.profiles.keys().cloned().collect();
    available.sort();
    CliError::ProfileNotFound {
        name: name.into(),
        available: if available.is_empty() {
            "(none)".into()
        } else {
            available.join(", ")
        },
    }
}

/// Translate the active profile + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve(global: &GlobalOpts) -> Result<Resolved, CliError> {
    let config = load_config_or_default();
    let profile_name = active_profile_name(global, &config);
    let profile = find_profile(&config, &profile_name)?;

    let mut controller = harvia_config::profile_to_controller_config(
        &profile,
        &profile_name,
        &config.defaults,
        &CredentialResolver::default(),
    )?;

    if let Some(timeout) = global.timeout {
        controller.timeout = Duration::from_secs(timeout);
    }

    Ok(Resolved {
        controller,
        device: global.device.clone().or(profile.device),
    })
}
