//! CLI configuration: thin wrapper around `filmdeck_config`.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--device, --prefix, --connect-timeout) on top of the chosen profile.

use filmdeck_core::DeviceConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use filmdeck_config::{
    Config, ConfigError, Profile, config_path, load_config, profile_to_device_config, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Build a `DeviceConfig` from the config file, profile, and CLI overrides.
///
/// Without any profile, `--device` alone is enough.
pub fn resolve_device_config(global: &GlobalOpts) -> Result<DeviceConfig, CliError> {
    let cfg = load_config()?;

    let mut profile = match cfg.profile(global.profile.as_deref()) {
        Ok((name, profile)) => {
            tracing::debug!(profile = %name, "using profile");
            profile.clone()
        }
        Err(ConfigError::NoProfile) => match global.device {
            Some(ref device) => Profile::new(device.clone()),
            None => return Err(ConfigError::NoProfile.into()),
        },
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(&cfg),
            });
        }
        Err(other) => return Err(other.into()),
    };

    // Flag > env > profile
    if let Some(ref device) = global.device {
        profile.url.clone_from(device);
    }
    if let Some(ref prefix) = global.prefix {
        profile.prefix.clone_from(prefix);
    }
    if let Some(timeout) = global.connect_timeout {
        profile.connect_timeout = Some(timeout);
    }

    Ok(profile_to_device_config(&profile, &cfg.defaults)?)
}

/// Comma-separated profile names, for error help text.
pub fn available_profiles(cfg: &Config) -> String {
    if cfg.profiles.is_empty() {
        return "(none)".into();
    }
    cfg.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
}
