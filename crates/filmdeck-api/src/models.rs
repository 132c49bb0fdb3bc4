// Wire types for the scanner backend.
//
// Field names follow the backend's JSON verbatim; `filmdeck-core`
// converts these into domain types.

use serde::{Deserialize, Serialize};

/// Snapshot of one controllable feature (`GET light`, `GET advance`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityResponse {
    pub is_active: bool,
    pub is_enabled: bool,
}

/// Snapshot of the scan session (`GET scan`).
///
/// `n_frames` and `output_directory` are `null` until the first scan
/// has been configured on the device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResponse {
    pub is_scanning: bool,
    #[serde(default)]
    pub output_directory: Option<String>,
    #[serde(default)]
    pub n_frames: Option<u32>,
    #[serde(default)]
    pub current_frame_index: u32,
    pub last_scan_end_info: String,
    #[serde(default)]
    pub time_remaining: Option<String>,
}

/// Body of `POST scan` when starting a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartScanBody {
    pub output_directory: String,
    pub n_frames: u32,
}

/// `{active, enabled}` pair inside an aggregate `state` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleState {
    pub active: bool,
    pub enabled: bool,
}

/// Payload of the dashboard stream's aggregate `state` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardEvent {
    pub advance_toggle: ToggleState,
    pub fast_forward_toggle: ToggleState,
    pub light_toggle: ToggleState,
    pub zoom_toggle: ToggleState,
    pub is_scanning: bool,
    pub current_frame_index: u32,
    pub last_scan_end_info: String,
    pub time_remaining: String,
    /// Sent by newer backends; not part of the reconciled state.
    #[serde(default)]
    pub is_scan_button_enabled: Option<bool>,
}

/// Payload of the dashboard stream's `scan_setup` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSetupEvent {
    pub n_frames: u32,
    pub output_directory: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn scan_response_before_first_scan() {
        let json = r#"{
            "is_scanning": false,
            "output_directory": null,
            "n_frames": null,
            "current_frame_index": 0,
            "last_scan_end_info": "dismissed",
            "time_remaining": "-"
        }"#;
        let scan: ScanResponse = serde_json::from_str(json).unwrap();
        assert!(!scan.is_scanning);
        assert!(scan.n_frames.is_none());
        assert!(scan.output_directory.is_none());
        assert_eq!(scan.time_remaining.as_deref(), Some("-"));
    }

    #[test]
    fn dashboard_event_ignores_unknown_fields() {
        let json = r#"{
            "advance_toggle": {"active": false, "enabled": true},
            "current_frame_index": 12,
            "fast_forward_toggle": {"active": false, "enabled": true},
            "is_scanning": true,
            "is_scan_button_enabled": true,
            "last_scan_end_info": "dismissed",
            "light_toggle": {"active": true, "enabled": false},
            "time_remaining": "0:41:10",
            "zoom_toggle": {"active": false, "enabled": false},
            "firmware": "2.1"
        }"#;
        let event: DashboardEvent = serde_json::from_str(json).unwrap();
        assert!(event.light_toggle.active);
        assert!(!event.light_toggle.enabled);
        assert_eq!(event.current_frame_index, 12);
        assert_eq!(event.is_scan_button_enabled, Some(true));
    }
}
