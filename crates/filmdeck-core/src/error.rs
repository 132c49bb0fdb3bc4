// ── Core error types ──
//
// User-facing errors from filmdeck-core. Consumers never see raw HTTP
// or JSON failures; `From<filmdeck_api::Error>` translates them into
// the variants below.

use thiserror::Error;

use crate::store::FieldError;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach scanner at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Scanner request timed out")]
    Timeout,

    #[error("Event stream unavailable: {reason}")]
    StreamUnavailable { reason: String },

    #[error("Controller is not active")]
    Disconnected,

    #[error("Controller is already active")]
    AlreadyActivated,

    // ── Backend errors ───────────────────────────────────────────────
    #[error("Scanner returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Invalid snapshot: {message}")]
    InvalidSnapshot { message: String },

    // ── Command errors ───────────────────────────────────────────────
    #[error("Command rejected: {message}")]
    Rejected { message: String },

    #[error("Validation failed: {message}")]
    ValidationFailed {
        /// The offending input, when the failure is tied to one.
        field: Option<String>,
        message: String,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field: Some(field.to_owned()),
            message: message.into(),
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<filmdeck_api::Error> for CoreError {
    fn from(err: filmdeck_api::Error) -> Self {
        match err {
            filmdeck_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Backend {
                        status: e.status().map(|s| s.as_u16()).unwrap_or_default(),
                        message: e.to_string(),
                    }
                }
            }
            filmdeck_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            filmdeck_api::Error::ClientBuild(message) => CoreError::Config { message },
            filmdeck_api::Error::Status { status: 404, url, .. } => {
                CoreError::NotFound { resource: url }
            }
            filmdeck_api::Error::Status { status, url, body } => CoreError::Backend {
                status,
                message: if body.is_empty() { url } else { body },
            },
            filmdeck_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidSnapshot { message }
            }
            filmdeck_api::Error::StreamConnect(reason)
            | filmdeck_api::Error::StreamRead(reason) => CoreError::StreamUnavailable { reason },
            filmdeck_api::Error::StreamAlreadyOpen { endpoint } => CoreError::StreamUnavailable {
                reason: format!("'{endpoint}' is already subscribed"),
            },
        }
    }
}

impl From<FieldError> for CoreError {
    fn from(err: FieldError) -> Self {
        CoreError::InvalidSnapshot {
            message: err.to_string(),
        }
    }
}
