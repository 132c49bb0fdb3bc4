// ── Scan lifecycle & poweroff confirmation ──
//
// Both machines are pure: they derive from, or check against, a
// `DashboardState` and never touch the network themselves.

use serde::Serialize;

use crate::command::Command;
use crate::error::CoreError;
use crate::model::{DashboardState, ScanOutcome, ScanSessionState};

/// Where the scanner is in its scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "outcome", rename_all = "snake_case")]
pub enum ScanPhase {
    /// Ready for a new scan.
    Idle,
    /// A scan is running; setup is locked.
    Scanning,
    /// The last scan finished and its result has not been dismissed yet.
    Completed(ScanOutcome),
}

impl ScanPhase {
    pub fn of(scan: &ScanSessionState) -> Self {
        if scan.is_scanning {
            return Self::Scanning;
        }
        match scan.last_outcome {
            ScanOutcome::Dismissed => Self::Idle,
            outcome => Self::Completed(outcome),
        }
    }

    pub fn can_start(self) -> bool {
        self == Self::Idle
    }

    /// Whether a completion alert is waiting for dismissal.
    pub fn has_alert(self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Poweroff confirmation gate.
///
/// `Available -> Confirming -> PoweringOff`, with `abort` going back to
/// `Available`. `PoweringOff` is terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    #[default]
    Available,
    Confirming,
    PoweringOff,
}

impl PowerState {
    /// Open the confirmation step.
    pub fn request(self, state: &DashboardState) -> Result<Self, CoreError> {
        match self {
            Self::PoweringOff => Err(CoreError::rejected("scanner is powering off")),
            _ if state.scan.is_scanning => {
                Err(CoreError::rejected("cannot power off while a scan is running"))
            }
            _ => Ok(Self::Confirming),
        }
    }

    /// Cancel a pending confirmation. A no-op unless `Confirming`.
    pub fn abort(self) -> Self {
        match self {
            Self::Confirming => Self::Available,
            other => other,
        }
    }

    /// Confirm a pending request, yielding the command to send.
    pub fn confirm(self, state: &DashboardState) -> Result<(Self, Command), CoreError> {
        match self {
            Self::Confirming if state.scan.is_scanning => {
                Err(CoreError::rejected("cannot power off while a scan is running"))
            }
            Self::Confirming => Ok((Self::PoweringOff, Command::Poweroff)),
            Self::Available => Err(CoreError::rejected("poweroff was not requested")),
            Self::PoweringOff => Err(CoreError::rejected("scanner is powering off")),
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::PoweringOff
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn scanning() -> DashboardState {
        let mut state = DashboardState::default();
        state.scan.is_scanning = true;
        state
    }

    #[test]
    fn phase_derivation() {
        let mut scan = ScanSessionState::default();
        assert_eq!(ScanPhase::of(&scan), ScanPhase::Idle);

        scan.last_outcome = ScanOutcome::Failure;
        assert_eq!(ScanPhase::of(&scan), ScanPhase::Completed(ScanOutcome::Failure));
        assert!(ScanPhase::of(&scan).has_alert());
        assert!(!ScanPhase::of(&scan).can_start());

        scan.is_scanning = true;
        assert_eq!(ScanPhase::of(&scan), ScanPhase::Scanning);
    }

    #[test]
    fn confirm_flow() {
        let idle = DashboardState::default();
        let gate = PowerState::default().request(&idle).unwrap();
        assert_eq!(gate, PowerState::Confirming);

        let (gate, command) = gate.confirm(&idle).unwrap();
        assert_eq!(gate, PowerState::PoweringOff);
        assert_eq!(command, Command::Poweroff);
        assert!(gate.is_terminal());
    }

    #[test]
    fn abort_returns_to_available() {
        let gate = PowerState::default().request(&DashboardState::default()).unwrap();
        assert_eq!(gate.abort(), PowerState::Available);
        assert_eq!(PowerState::PoweringOff.abort(), PowerState::PoweringOff);
    }

    #[test]
    fn request_rejected_while_scanning() {
        let err = PowerState::default().request(&scanning()).unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn confirm_requires_request() {
        let idle = DashboardState::default();
        assert!(PowerState::Available.confirm(&idle).is_err());
        assert!(PowerState::PoweringOff.confirm(&idle).is_err());
        assert!(PowerState::PoweringOff.request(&idle).is_err());
    }
}
