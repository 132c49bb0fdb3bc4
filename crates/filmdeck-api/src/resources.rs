// Typed endpoints for the scanner backend's resources.

use crate::client::BackendClient;
use crate::error::Error;
use crate::models::{CapabilityResponse, ScanResponse, StartScanBody};

pub const LIGHT: &str = "light";
pub const ADVANCE: &str = "advance";
pub const FAST_FORWARD: &str = "fastforward";
pub const FOCUS_ZOOM: &str = "focuszoom";
pub const SCAN: &str = "scan";
pub const DISMISS: &str = "dismiss";
pub const POWEROFF: &str = "poweroff";

/// Shared dashboard event stream.
pub const DASHBOARD_STREAM: &str = "dashboard-sse";

/// Per-resource stream endpoint, e.g. `light-stream`.
pub fn stream_endpoint(resource: &str) -> String {
    format!("{resource}-stream")
}

impl BackendClient {
    /// `GET <resource>` for one of the toggle-style resources.
    pub async fn get_capability(&self, resource: &str) -> Result<CapabilityResponse, Error> {
        self.get_json(resource).await
    }

    /// `GET scan`
    pub async fn get_scan(&self) -> Result<ScanResponse, Error> {
        self.get_json(SCAN).await
    }

    /// `POST scan` with the scan setup. Starts a scan on an idle device.
    pub async fn start_scan(&self, body: &StartScanBody) -> Result<(), Error> {
        self.post_json(SCAN, body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_endpoints() {
        assert_eq!(stream_endpoint(LIGHT), "light-stream");
        assert_eq!(stream_endpoint(FAST_FORWARD), "fastforward-stream");
    }
}
