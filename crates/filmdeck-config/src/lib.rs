//! Shared configuration for the filmdeck CLI.
//!
//! TOML profiles, `FILMDECK_*` environment overrides, and translation
//! to `filmdeck_core::DeviceConfig`. The CLI layers its flag overrides
//! on top of what this crate resolves.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use filmdeck_core::DeviceConfig;

/// Stream value selecting the legacy per-resource streams.
pub const PER_RESOURCE_STREAMS: &str = "per-resource";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("no scanner configured")]
    NoProfile,

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
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named scanner profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_connect_timeout() -> u64 {
    10
}

/// A named scanner profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Profile {
    /// Scanner base URL (e.g., "http://scanner.local:5000").
    pub url: String,

    /// Route prefix of the backend below `url`.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Event stream endpoint, or `per-resource`.
    #[serde(default = "default_stream")]
    pub stream: String,

    /// Override the connect timeout (seconds).
    pub connect_timeout: Option<u64>,

    /// Bound snapshot and command requests (seconds). Unbounded if unset.
    pub request_timeout: Option<u64>,
}

impl Profile {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: default_prefix(),
            stream: default_stream(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

fn default_prefix() -> String {
    "backend".into()
}
fn default_stream() -> String {
    "dashboard-sse".into()
}

impl Config {
    /// Pick a profile: the named one, else `default_profile`, else the
    /// only profile if there is exactly one.
    pub fn profile(&self, name: Option<&str>) -> Result<(String, &Profile), ConfigError> {
        if let Some(name) = name {
            return self
                .profiles
                .get(name)
                .map(|p| (name.to_owned(), p))
                .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() });
        }

        if let Some(ref name) = self.default_profile {
            if let Some(profile) = self.profiles.get(name) {
                return Ok((name.clone(), profile));
            }
        }

        match self.profiles.iter().next() {
            Some((name, profile)) if self.profiles.len() == 1 => Ok((name.clone(), profile)),
            _ => Err(ConfigError::NoProfile),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "filmdeck", "filmdeck").map_or_else(
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
    p.push("filmdeck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file is not an error.
///
/// Environment keys nest with `__`, e.g.
/// `FILMDECK_PROFILES__LAB__URL=http://10.0.0.7:5000`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("FILMDECK_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
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

// ── DeviceConfig translation ────────────────────────────────────────

/// Join the route prefix onto the scanner URL.
///
/// `http://scanner:5000` + `backend` -> `http://scanner:5000/backend/`.
pub fn backend_url(url: &str, prefix: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::Validation {
        field: "url".into(),
        reason,
    };

    let mut base: Url = url
        .parse()
        .map_err(|e| invalid(format!("invalid URL '{url}': {e}")))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        return Ok(base);
    }
    base.join(&format!("{prefix}/"))
        .map_err(|e| invalid(format!("invalid prefix '{prefix}': {e}")))
}

/// Build a `DeviceConfig` from a profile, no CLI flag overrides.
pub fn profile_to_device_config(
    profile: &Profile,
    defaults: &Defaults,
) -> Result<DeviceConfig, ConfigError> {
    let url = backend_url(&profile.url, &profile.prefix)?;
    let mut config = DeviceConfig::new(url);

    config = match profile.stream.trim() {
        "" => {
            return Err(ConfigError::Validation {
                field: "stream".into(),
                reason: "must not be empty".into(),
            });
        }
        PER_RESOURCE_STREAMS => config.with_per_resource_streams(),
        endpoint => config.with_stream(endpoint),
    };

    config.connect_timeout =
        Duration::from_secs(profile.connect_timeout.unwrap_or(defaults.connect_timeout));
    config.request_timeout = profile.request_timeout.map(Duration::from_secs);
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn backend_url_joins_prefix() {
        assert_eq!(
            backend_url("http://scanner.local:5000", "backend").unwrap().as_str(),
            "http://scanner.local:5000/backend/"
        );
        assert_eq!(
            backend_url("http://scanner.local/api/", "/backend/").unwrap().as_str(),
            "http://scanner.local/api/backend/"
        );
        assert_eq!(
            backend_url("http://scanner.local", "").unwrap().as_str(),
            "http://scanner.local/"
        );
    }

    #[test]
    fn backend_url_rejects_garbage() {
        assert!(backend_url("scanner.local", "backend").is_err());
        assert!(backend_url("ftp://scanner.local", "backend").is_err());
    }

    #[test]
    fn profile_translation() {
        let mut profile = Profile::new("http://10.0.0.7:5000");
        profile.request_timeout = Some(3);
        let config = profile_to_device_config(&profile, &Defaults::default()).unwrap();

        assert_eq!(config.url.as_str(), "http://10.0.0.7:5000/backend/");
        assert_eq!(config.streams[0].endpoint, "dashboard-sse");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn per_resource_profile() {
        let mut profile = Profile::new("http://10.0.0.7:5000");
        profile.stream = PER_RESOURCE_STREAMS.into();
        let config = profile_to_device_config(&profile, &Defaults::default()).unwrap();
        assert_eq!(config.streams.len(), 4);
        assert!(config.snapshot_guards);
    }

    #[test]
    fn profile_selection() {
        let mut cfg = Config::default();
        assert!(matches!(cfg.profile(None), Err(ConfigError::NoProfile)));

        cfg.profiles.insert("lab".into(), Profile::new("http://lab:5000"));
        assert_eq!(cfg.profile(None).unwrap().0, "lab");
        assert!(matches!(
            cfg.profile(Some("attic")),
            Err(ConfigError::UnknownProfile { .. })
        ));

        cfg.profiles.insert("default".into(), Profile::new("http://home:5000"));
        assert_eq!(cfg.profile(None).unwrap().1.url, "http://home:5000");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("http://scanner.local:5000");
        profile.connect_timeout = Some(4);
        cfg.profiles.insert("default".into(), profile);
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profiles, cfg.profiles);
    }

    #[test]
    fn env_overrides_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
                [profiles.lab]
                url = "http://lab:5000"
                "#,
            )?;
            jail.set_env("FILMDECK_PROFILES__LAB__URL", "http://10.1.1.9:5000");
            jail.set_env("FILMDECK_DEFAULTS__CONNECT_TIMEOUT", "2");

            let cfg = load_config_from(Path::new("config.toml")).map_err(|e| e.to_string())?;
            assert_eq!(cfg.profiles["lab"].url, "http://10.1.1.9:5000");
            assert_eq!(cfg.profiles["lab"].prefix, "backend");
            assert_eq!(cfg.defaults.connect_timeout, 2);
            Ok(())
        });
    }
}
