// Shared transport configuration for building reqwest::Client instances.
//
// The same client serves snapshots, commands and the long-lived event
// stream, so only the connect phase is bounded here. Per-request
// timeouts are applied by `BackendClient` and never to the stream.

use std::time::Duration;

use crate::error::Error;

const USER_AGENT: &str = concat!("filmdeck/", env!("CARGO_PKG_VERSION"));

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Upper bound on establishing a TCP connection.
    pub connect_timeout: Duration,
    /// Optional bound on snapshot and command requests. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::ClientBuild(e.to_string()))
    }
}
