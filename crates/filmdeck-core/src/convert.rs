// ── API-to-domain type conversions ──
//
// Bridges raw `filmdeck_api::models` wire types into `filmdeck_core::model`
// domain types. Absent optional data falls back to the model defaults;
// values the domain cannot represent are rejected.

use std::num::NonZeroU32;

use filmdeck_api::models::{
    CapabilityResponse, DashboardEvent, ScanResponse, ScanSetupEvent, ToggleState,
};

use crate::error::CoreError;
use crate::model::{CapabilityState, ScanOutcome, ScanSessionState};
use crate::store::{DashboardUpdate, FieldUpdate};

// ── Helpers ────────────────────────────────────────────────────────

fn parse_outcome(raw: &str) -> Result<ScanOutcome, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::InvalidSnapshot {
            message: format!("unknown scan outcome '{raw}'"),
        })
}

fn frame_count(raw: u32) -> Result<NonZeroU32, CoreError> {
    NonZeroU32::new(raw).ok_or_else(|| CoreError::InvalidSnapshot {
        message: "n_frames must be greater than zero".into(),
    })
}

// ── Capabilities ───────────────────────────────────────────────────

impl From<CapabilityResponse> for CapabilityState {
    fn from(raw: CapabilityResponse) -> Self {
        Self::new(raw.is_enabled, raw.is_active)
    }
}

impl From<ToggleState> for CapabilityState {
    fn from(raw: ToggleState) -> Self {
        Self::new(raw.enabled, raw.active)
    }
}

// ── Scan session ───────────────────────────────────────────────────

/// `n_frames`/`output_directory` are null until the first scan has been
/// configured; keep the defaults in that case.
impl TryFrom<ScanResponse> for ScanSessionState {
    type Error = CoreError;

    fn try_from(raw: ScanResponse) -> Result<Self, Self::Error> {
        let defaults = ScanSessionState::default();
        Ok(Self {
            is_scanning: raw.is_scanning,
            output_directory: raw.output_directory.unwrap_or(defaults.output_directory),
            target_frame_count: match raw.n_frames {
                Some(n) => frame_count(n)?,
                None => defaults.target_frame_count,
            },
            current_frame_index: raw.current_frame_index,
            last_outcome: parse_outcome(&raw.last_scan_end_info)?,
            time_remaining: raw.time_remaining.unwrap_or(defaults.time_remaining),
        })
    }
}

// ── Aggregate stream events ────────────────────────────────────────

impl TryFrom<ScanSetupEvent> for FieldUpdate {
    type Error = CoreError;

    fn try_from(raw: ScanSetupEvent) -> Result<Self, Self::Error> {
        Ok(Self::ScanSetup {
            output_directory: raw.output_directory,
            target_frame_count: frame_count(raw.n_frames)?,
        })
    }
}

/// `is_scan_button_enabled` is derived on the backend and not part of
/// the reconciled state; it is dropped here.
impl TryFrom<DashboardEvent> for DashboardUpdate {
    type Error = CoreError;

    fn try_from(raw: DashboardEvent) -> Result<Self, Self::Error> {
        Ok(Self {
            light: raw.light_toggle.into(),
            advance: raw.advance_toggle.into(),
            fast_forward: raw.fast_forward_toggle.into(),
            zoom: raw.zoom_toggle.into(),
            is_scanning: raw.is_scanning,
            current_frame_index: raw.current_frame_index,
            last_outcome: parse_outcome(&raw.last_scan_end_info)?,
            time_remaining: raw.time_remaining,
        })
    }
}
