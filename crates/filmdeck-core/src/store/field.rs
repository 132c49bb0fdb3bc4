// ── Named state fields ──
//
// Maps `(event name, payload)` pairs from the event stream onto typed
// updates of `DashboardState`. Parsing is total before anything is
// applied, so a malformed payload never half-updates the aggregate.

use std::num::NonZeroU32;

use filmdeck_api::models::{DashboardEvent, ScanSetupEvent};
use thiserror::Error;

use crate::model::{Capability, CapabilityState, DashboardState, ScanOutcome};

/// Why an event could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown event '{name}'")]
    UnknownEvent { name: String },

    #[error("event '{event}' expected {expected}, got {payload:?}")]
    InvalidPayload {
        event: String,
        expected: &'static str,
        payload: String,
    },
}

/// Every field group carried by an aggregate `state` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardUpdate {
    pub light: CapabilityState,
    pub advance: CapabilityState,
    pub fast_forward: CapabilityState,
    pub zoom: CapabilityState,
    pub is_scanning: bool,
    pub current_frame_index: u32,
    pub last_outcome: ScanOutcome,
    pub time_remaining: String,
}

/// A parsed, ready-to-apply change to the aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    CapabilityEnabled(Capability, bool),
    CapabilityActive(Capability, bool),
    IsScanning(bool),
    OutputDirectory(String),
    TargetFrameCount(NonZeroU32),
    CurrentFrameIndex(u32),
    LastOutcome(ScanOutcome),
    TimeRemaining(String),
    /// Both scan setup fields at once (`scan_setup`).
    ScanSetup {
        output_directory: String,
        target_frame_count: NonZeroU32,
    },
    /// Everything but the scan setup (`state`).
    Dashboard(Box<DashboardUpdate>),
}

/// Accepts the backend's `True`/`False` as well as JSON-style `true`/`false`.
fn parse_bool(payload: &str) -> Option<bool> {
    match payload.trim() {
        "True" | "true" => Some(true),
        "False" | "false" => Some(false),
        _ => None,
    }
}

impl FieldUpdate {
    /// Parse one named event.
    ///
    /// String fields pass through untouched; every other payload is
    /// trimmed before parsing.
    pub fn parse(name: &str, payload: &str) -> Result<Self, FieldError> {
        let invalid = |expected: &'static str| FieldError::InvalidPayload {
            event: name.to_owned(),
            expected,
            payload: payload.to_owned(),
        };

        match name {
            "is_scanning" => parse_bool(payload)
                .map(Self::IsScanning)
                .ok_or_else(|| invalid("a boolean")),
            "output_directory" => Ok(Self::OutputDirectory(payload.to_owned())),
            "n_frames" => payload
                .trim()
                .parse::<NonZeroU32>()
                .map(Self::TargetFrameCount)
                .map_err(|_| invalid("a positive integer")),
            "current_frame_index" => payload
                .trim()
                .parse::<u32>()
                .map(Self::CurrentFrameIndex)
                .map_err(|_| invalid("a non-negative integer")),
            "last_scan_end_info" => payload
                .trim()
                .parse::<ScanOutcome>()
                .map(Self::LastOutcome)
                .map_err(|_| invalid("dismissed, success or failure")),
            "time_remaining" => Ok(Self::TimeRemaining(payload.to_owned())),
            "scan_setup" => {
                let event: ScanSetupEvent =
                    serde_json::from_str(payload.trim()).map_err(|_| invalid("a scan setup object"))?;
                Self::try_from(event).map_err(|_| invalid("a scan setup with n_frames > 0"))
            }
            "state" => {
                let event: DashboardEvent =
                    serde_json::from_str(payload.trim()).map_err(|_| invalid("a dashboard state object"))?;
                let update = DashboardUpdate::try_from(event)
                    .map_err(|_| invalid("a dashboard state with a known scan outcome"))?;
                Ok(Self::Dashboard(Box::new(update)))
            }
            _ => Self::parse_capability(name, payload),
        }
    }

    /// `<capability>_active` / `<capability>_enabled`.
    fn parse_capability(name: &str, payload: &str) -> Result<Self, FieldError> {
        let unknown = || FieldError::UnknownEvent {
            name: name.to_owned(),
        };

        let (prefix, attribute) = name.rsplit_once('_').ok_or_else(unknown)?;
        let capability: Capability = prefix.parse().map_err(|_| unknown())?;
        let make: fn(Capability, bool) -> Self = match attribute {
            "active" => Self::CapabilityActive,
            "enabled" => Self::CapabilityEnabled,
            _ => return Err(unknown()),
        };

        let value = parse_bool(payload).ok_or_else(|| FieldError::InvalidPayload {
            event: name.to_owned(),
            expected: "a boolean",
            payload: payload.to_owned(),
        })?;
        Ok(make(capability, value))
    }

    /// Write this update into `state`, leaving every other field alone.
    pub fn apply_to(self, state: &mut DashboardState) {
        match self {
            Self::CapabilityEnabled(capability, enabled) => {
                state.capability_mut(capability).enabled = enabled;
            }
            Self::CapabilityActive(capability, active) => {
                state.capability_mut(capability).active = active;
            }
            Self::IsScanning(value) => state.scan.is_scanning = value,
            Self::OutputDirectory(dir) => state.scan.output_directory = dir,
            Self::TargetFrameCount(count) => state.scan.target_frame_count = count,
            Self::CurrentFrameIndex(index) => state.scan.current_frame_index = index,
            Self::LastOutcome(outcome) => state.scan.last_outcome = outcome,
            Self::TimeRemaining(value) => state.scan.time_remaining = value,
            Self::ScanSetup {
                output_directory,
                target_frame_count,
            } => {
                state.scan.output_directory = output_directory;
                state.scan.target_frame_count = target_frame_count;
            }
            Self::Dashboard(update) => {
                let DashboardUpdate {
                    light,
                    advance,
                    fast_forward,
                    zoom,
                    is_scanning,
                    current_frame_index,
                    last_outcome,
                    time_remaining,
                } = *update;
                state.light = light;
                state.advance = advance;
                state.fast_forward = fast_forward;
                state.zoom = zoom;
                state.scan.is_scanning = is_scanning;
                state.scan.current_frame_index = current_frame_index;
                state.scan.last_outcome = last_outcome;
                state.scan.time_remaining = time_remaining;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn capability_events() {
        assert_eq!(
            FieldUpdate::parse("fast_forward_enabled", "True").unwrap(),
            FieldUpdate::CapabilityEnabled(Capability::FastForward, true)
        );
        assert_eq!(
            FieldUpdate::parse("zoom_active", " false \n").unwrap(),
            FieldUpdate::CapabilityActive(Capability::Zoom, false)
        );
    }

    #[test]
    fn unknown_names_are_reported_before_payload() {
        for name in ["light_dimmed", "laser_active", "bogus", "", "_active"] {
            let err = FieldUpdate::parse(name, "not-a-bool").unwrap_err();
            assert!(matches!(err, FieldError::UnknownEvent { .. }), "{name}: {err:?}");
        }
    }

    #[test]
    fn malformed_payloads() {
        let cases = [
            ("light_active", "yes"),
            ("is_scanning", "1"),
            ("n_frames", "0"),
            ("n_frames", "-3"),
            ("current_frame_index", "twelve"),
            ("last_scan_end_info", "Success!"),
            ("scan_setup", "{\"n_frames\": 0, \"output_directory\": \"/x\"}"),
            ("state", "{}"),
        ];
        for (name, payload) in cases {
            let err = FieldUpdate::parse(name, payload).unwrap_err();
            assert!(matches!(err, FieldError::InvalidPayload { .. }), "{name}={payload}");
        }
    }

    #[test]
    fn numeric_payloads_are_trimmed() {
        assert_eq!(
            FieldUpdate::parse("current_frame_index", " 121 ").unwrap(),
            FieldUpdate::CurrentFrameIndex(121)
        );
        assert_eq!(
            FieldUpdate::parse("n_frames", "36\n").unwrap(),
            FieldUpdate::TargetFrameCount(NonZeroU32::new(36).unwrap())
        );
    }

    #[test]
    fn string_payloads_pass_through() {
        assert_eq!(
            FieldUpdate::parse("output_directory", " /mnt/roll 7 ").unwrap(),
            FieldUpdate::OutputDirectory(" /mnt/roll 7 ".into())
        );
        assert_eq!(
            FieldUpdate::parse("time_remaining", "0:41:10").unwrap(),
            FieldUpdate::TimeRemaining("0:41:10".into())
        );
    }

    #[test]
    fn scan_setup_sets_both_fields() {
        let mut state = DashboardState::default();
        FieldUpdate::parse("scan_setup", r#"{"n_frames": 36, "output_directory": "/mnt/a"}"#)
            .unwrap()
            .apply_to(&mut state);
        assert_eq!(state.scan.output_directory, "/mnt/a");
        assert_eq!(state.scan.target_frame_count.get(), 36);
    }

    #[test]
    fn state_event_leaves_scan_setup_alone() {
        let mut state = DashboardState::default();
        state.scan.output_directory = "/mnt/keep".into();
        state.scan.target_frame_count = NonZeroU32::new(12).unwrap();

        let payload = r#"{
            "advance_toggle": {"active": false, "enabled": true},
            "fast_forward_toggle": {"active": true, "enabled": true},
            "light_toggle": {"active": true, "enabled": false},
            "zoom_toggle": {"active": false, "enabled": false},
            "is_scanning": true,
            "current_frame_index": 3,
            "last_scan_end_info": "dismissed",
            "time_remaining": "0:02:00"
        }"#;
        FieldUpdate::parse("state", payload).unwrap().apply_to(&mut state);

        assert_eq!(state.light, CapabilityState::new(false, true));
        assert_eq!(state.fast_forward, CapabilityState::new(true, true));
        assert!(state.scan.is_scanning);
        assert_eq!(state.scan.current_frame_index, 3);
        assert_eq!(state.scan.output_directory, "/mnt/keep");
        assert_eq!(state.scan.target_frame_count.get(), 12);
    }
}
