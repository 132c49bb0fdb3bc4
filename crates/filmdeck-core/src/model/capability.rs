// ── Controllable device features ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// `{enabled, active}` for one controllable feature.
///
/// Defaults to fully off: nothing is actionable before the first
/// snapshot tells us otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityState {
    /// Whether a command for this feature may be issued.
    pub enabled: bool,
    /// Whether the feature is currently engaged.
    ///
    /// Stored and rendered as reported even while `enabled` is false.
    pub active: bool,
}

impl CapabilityState {
    pub const fn new(enabled: bool, active: bool) -> Self {
        Self { enabled, active }
    }

    /// A disabled capability is never user-actionable.
    pub const fn is_actionable(self) -> bool {
        self.enabled
    }
}

/// The features the scanner exposes as buttons.
///
/// The snake_case name doubles as the event-name prefix on the
/// dashboard stream (`fast_forward_active`, `zoom_enabled`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    /// Backlight illumination.
    Light,
    /// Single-frame advance.
    Advance,
    /// Continuous winding until stopped.
    FastForward,
    /// Focus zoom on the live preview.
    Zoom,
}

impl Capability {
    pub const ALL: [Self; 4] = [Self::Light, Self::Advance, Self::FastForward, Self::Zoom];

    /// Backend resource serving this feature's snapshot and commands.
    pub const fn resource(self) -> &'static str {
        match self {
            Self::Light => filmdeck_api::resources::LIGHT,
            Self::Advance => filmdeck_api::resources::ADVANCE,
            Self::FastForward => filmdeck_api::resources::FAST_FORWARD,
            Self::Zoom => filmdeck_api::resources::FOCUS_ZOOM,
        }
    }

    /// Human-readable name.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Advance => "Advance",
            Self::FastForward => "Fast-forward",
            Self::Zoom => "Focus zoom",
        }
    }

    /// Event name carrying this feature's `active` flag.
    pub fn active_event(self) -> String {
        format!("{self}_active")
    }

    /// Event name carrying this feature's `enabled` flag.
    pub fn enabled_event(self) -> String {
        format!("{self}_enabled")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn default_is_not_actionable() {
        let state = CapabilityState::default();
        assert!(!state.is_actionable());
        assert!(!state.active);
    }

    #[test]
    fn disabled_but_active_is_still_not_actionable() {
        let state = CapabilityState::new(false, true);
        assert!(!state.is_actionable());
        assert!(state.active);
    }

    #[test]
    fn names_round_trip_through_strum() {
        for cap in Capability::ALL {
            let parsed: Capability = cap.to_string().parse().unwrap();
            assert_eq!(parsed, cap);
        }
        assert_eq!(Capability::FastForward.active_event(), "fast_forward_active");
        assert_eq!(Capability::Zoom.resource(), "focuszoom");
    }
}
