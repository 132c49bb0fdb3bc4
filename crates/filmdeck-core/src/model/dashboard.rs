// ── Aggregate dashboard state ──

use serde::{Deserialize, Serialize};

use super::capability::{Capability, CapabilityState};
use super::scan::ScanSessionState;
use crate::lifecycle::ScanPhase;

/// Everything the client knows about the device: one
/// [`CapabilityState`] per feature plus the scan session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardState {
    pub light: CapabilityState,
    pub advance: CapabilityState,
    pub fast_forward: CapabilityState,
    pub zoom: CapabilityState,
    pub scan: ScanSessionState,
}

impl DashboardState {
    pub fn capability(&self, capability: Capability) -> CapabilityState {
        match capability {
            Capability::Light => self.light,
            Capability::Advance => self.advance,
            Capability::FastForward => self.fast_forward,
            Capability::Zoom => self.zoom,
        }
    }

    pub(crate) fn capability_mut(&mut self, capability: Capability) -> &mut CapabilityState {
        match capability {
            Capability::Light => &mut self.light,
            Capability::Advance => &mut self.advance,
            Capability::FastForward => &mut self.fast_forward,
            Capability::Zoom => &mut self.zoom,
        }
    }

    /// All capabilities in display order.
    pub fn capabilities(&self) -> impl Iterator<Item = (Capability, CapabilityState)> + '_ {
        Capability::ALL
            .into_iter()
            .map(|capability| (capability, self.capability(capability)))
    }

    /// Derived scan lifecycle phase.
    pub fn phase(&self) -> ScanPhase {
        ScanPhase::of(&self.scan)
    }
}
