// ── Runtime connection configuration ──
//
// Describes *how* to reach one scanner backend. Never touches disk:
// the CLI builds a `DeviceConfig` from its profiles and hands it in.

use std::time::Duration;

use filmdeck_api::resources::{self, DASHBOARD_STREAM};
use filmdeck_api::{StreamSubscription, TransportConfig};
use url::Url;

use crate::model::Capability;

/// Configuration for one scanner backend.
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    /// Backend base URL including the route prefix,
    /// e.g. `http://scanner.local:5000/backend/`.
    pub url: Url,
    /// Event streams to subscribe to on activation.
    pub streams: Vec<StreamSubscription>,
    /// TCP connect timeout. Requests themselves are not timed out.
    pub connect_timeout: Duration,
    /// Optional per-request timeout for snapshots and commands.
    pub request_timeout: Option<Duration>,
    /// Check each command against a freshly fetched snapshot rather than
    /// the reconciled state. Set for streams that omit guard fields.
    pub snapshot_guards: bool,
}

impl DeviceConfig {
    /// Connect to `url`, subscribing to the shared dashboard stream.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            streams: vec![StreamSubscription::new(DASHBOARD_STREAM)],
            connect_timeout: TransportConfig::default().connect_timeout,
            request_timeout: None,
            snapshot_guards: false,
        }
    }

    /// Replace the stream list with a single named stream.
    pub fn with_stream(mut self, endpoint: impl Into<String>) -> Self {
        self.streams = vec![StreamSubscription::new(endpoint)];
        self
    }

    /// Subscribe to the legacy one-stream-per-resource endpoints instead
    /// of the dashboard stream. Each of those streams only reports its
    /// capability's `active` flag, so commands are guarded against a
    /// fresh snapshot.
    pub fn with_per_resource_streams(mut self) -> Self {
        self.streams = per_resource_streams();
        self.snapshot_guards = true;
        self
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            connect_timeout: self.connect_timeout,
            request_timeout: self.request_timeout,
        }
    }
}

fn per_resource_streams() -> Vec<StreamSubscription> {
    Capability::ALL
        .into_iter()
        .map(|capability| {
            StreamSubscription::new(resources::stream_endpoint(capability.resource()))
                .unnamed_as(capability.active_event())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn defaults_to_dashboard_stream() {
        let config = DeviceConfig::new("http://scanner.local/backend/".parse().unwrap());
        assert_eq!(config.streams.len(), 1);
        assert_eq!(config.streams[0].endpoint, "dashboard-sse");
        assert!(config.request_timeout.is_none());
        assert!(!config.snapshot_guards);
    }

    #[test]
    fn per_resource_streams_rename_events() {
        let config = DeviceConfig::new("http://scanner.local/backend/".parse().unwrap())
            .with_per_resource_streams();
        let endpoints: Vec<&str> = config.streams.iter().map(|s| s.endpoint.as_str()).collect();
        assert_eq!(
            endpoints,
            vec!["light-stream", "advance-stream", "fastforward-stream", "focuszoom-stream"]
        );
        assert_eq!(config.streams[3].unnamed_as.as_deref(), Some("zoom_active"));
        assert!(config.snapshot_guards);
    }
}
