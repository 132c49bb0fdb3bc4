//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors
//! with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use filmdeck_config::ConfigError;
use filmdeck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    #[allow(dead_code)]
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to scanner at {url}")]
    #[diagnostic(
        code(filmdeck::connection_failed),
        help(
            "Check that the scanner is powered on and reachable.\n\
             URL: {url}"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Lost the scanner's event stream: {reason}")]
    #[diagnostic(
        code(filmdeck::stream_lost),
        help("The stream is not reopened automatically. Run the command again to reconnect.")
    )]
    StreamLost { reason: String },

    #[error("Request to the scanner timed out")]
    #[diagnostic(
        code(filmdeck::timeout),
        help("Increase --connect-timeout or check the scanner's network connection.")
    )]
    Timeout,

    // ── Scanner responses ────────────────────────────────────────────
    #[error("Scanner resource '{resource}' not found")]
    #[diagnostic(
        code(filmdeck::not_found),
        help("Check the profile's prefix; the default is 'backend'.")
    )]
    NotFound { resource: String },

    #[error("Scanner error (HTTP {status}): {message}")]
    #[diagnostic(code(filmdeck::backend))]
    Backend { status: u16, message: String },

    #[error("Scanner sent an unexpected response: {message}")]
    #[diagnostic(code(filmdeck::invalid_response))]
    InvalidResponse { message: String },

    // ── Commands ─────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(filmdeck::rejected),
        help("Run: filmdeck status to see what the scanner currently allows.")
    )]
    Rejected { message: String },

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(filmdeck::validation))]
    Validation { field: String, reason: String },

    #[error("'{action}' was cancelled")]
    #[diagnostic(code(filmdeck::cancelled))]
    Cancelled { action: String },

    #[error("'{action}' requires confirmation")]
    #[diagnostic(
        code(filmdeck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(filmdeck::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: filmdeck config init --name {name}"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No scanner configured")]
    #[diagnostic(
        code(filmdeck::no_config),
        help(
            "Create a profile with: filmdeck config init\n\
             Or pass --device <URL>.\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Configuration error: {0}")]
    #[diagnostic(code(filmdeck::config))]
    Config(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(filmdeck::render))]
    Render(String),

    #[error("Internal error: {0}")]
    #[diagnostic(code(filmdeck::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::StreamLost { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::CONFLICT,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::ProfileNotFound { .. }
            | Self::NoConfig { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },
            CoreError::Timeout => CliError::Timeout,
            CoreError::StreamUnavailable { reason } => CliError::StreamLost { reason },
            CoreError::Disconnected | CoreError::AlreadyActivated => {
                CliError::Internal(err.to_string())
            }
            CoreError::Backend { status, message } => CliError::Backend { status, message },
            CoreError::NotFound { resource } => CliError::NotFound { resource },
            CoreError::InvalidSnapshot { message } => CliError::InvalidResponse { message },
            CoreError::Rejected { message } => CliError::Rejected { message },
            CoreError::ValidationFailed { field, message } => CliError::Validation {
                field: field.unwrap_or_else(|| "input".into()),
                reason: message,
            },
            CoreError::Config { message } => CliError::Config(message),
            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::UnknownProfile { name } => CliError::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::NoProfile => CliError::NoConfig {
                path: filmdeck_config::config_path().display().to_string(),
            },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_are_conflicts() {
        let err = CliError::from(CoreError::Rejected {
            message: "Light is not enabled".into(),
        });
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
        assert_eq!(err.to_string(), "Light is not enabled");
    }

    #[test]
    fn missing_profile_is_usage() {
        let err = CliError::from(ConfigError::NoProfile);
        assert_eq!(err.exit_code(), exit_code::USAGE);
    }
}
