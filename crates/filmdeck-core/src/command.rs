// ── Command API ──
//
// Every write to the scanner flows through the `Command` enum. Guards
// are checked against the latest reconciled state before any network
// I/O; the dispatcher never mutates that state; the event stream
// reports the outcome.

use std::sync::Arc;

use filmdeck_api::BackendClient;
use filmdeck_api::models::StartScanBody;
use filmdeck_api::resources;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::lifecycle::ScanPhase;
use crate::model::{Capability, DashboardState};

/// Scan setup entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartScanRequest {
    pub output_directory: String,
    pub target_frame_count: u32,
}

impl StartScanRequest {
    pub fn new(output_directory: impl Into<String>, target_frame_count: u32) -> Self {
        Self {
            output_directory: output_directory.into(),
            target_frame_count,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.output_directory.trim().is_empty() {
            return Err(CoreError::invalid(
                "output_directory",
                "output directory must not be empty",
            ));
        }
        if self.target_frame_count == 0 {
            return Err(CoreError::invalid(
                "target_frame_count",
                "frame count must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl From<&StartScanRequest> for StartScanBody {
    fn from(request: &StartScanRequest) -> Self {
        Self {
            output_directory: request.output_directory.clone(),
            n_frames: request.target_frame_count,
        }
    }
}

/// All write operations against the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Capabilities ─────────────────────────────────────────────────
    Advance,
    ToggleLight,
    ToggleFastForward,
    ToggleZoom,

    // ── Scan ─────────────────────────────────────────────────────────
    StartScan(StartScanRequest),
    StopScan,
    DismissAlert,

    // ── Power ────────────────────────────────────────────────────────
    Poweroff,
}

/// Result of a successfully sent command.
///
/// The backend answers commands without a body; the new state arrives
/// over the event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
}

impl Command {
    /// The command for triggering a capability.
    pub fn for_capability(capability: Capability) -> Self {
        match capability {
            Capability::Light => Self::ToggleLight,
            Capability::Advance => Self::Advance,
            Capability::FastForward => Self::ToggleFastForward,
            Capability::Zoom => Self::ToggleZoom,
        }
    }

    /// The capability this command triggers, if any.
    pub fn capability(&self) -> Option<Capability> {
        match self {
            Self::ToggleLight => Some(Capability::Light),
            Self::Advance => Some(Capability::Advance),
            Self::ToggleFastForward => Some(Capability::FastForward),
            Self::ToggleZoom => Some(Capability::Zoom),
            _ => None,
        }
    }

    /// Backend resource the command is `POST`ed to.
    pub fn resource(&self) -> &'static str {
        if let Some(capability) = self.capability() {
            return capability.resource();
        }
        match self {
            Self::StartScan(_) | Self::StopScan => resources::SCAN,
            Self::DismissAlert => resources::DISMISS,
            _ => resources::POWEROFF,
        }
    }

    /// Check the command against the current state without sending it.
    pub fn check(&self, state: &DashboardState) -> Result<(), CoreError> {
        if let Some(capability) = self.capability() {
            if !state.capability(capability).is_actionable() {
                return Err(CoreError::rejected(format!(
                    "{} is not enabled",
                    capability.label()
                )));
            }
            return Ok(());
        }

        match self {
            Self::StartScan(request) => match state.phase() {
                ScanPhase::Idle => request.validate(),
                ScanPhase::Scanning => Err(CoreError::rejected("a scan is already running")),
                ScanPhase::Completed(outcome) => Err(CoreError::rejected(format!(
                    "the last scan ended with {outcome}; dismiss it first"
                ))),
            },
            Self::StopScan if state.phase() != ScanPhase::Scanning => {
                Err(CoreError::rejected("no scan is running"))
            }
            Self::Poweroff if state.scan.is_scanning => {
                Err(CoreError::rejected("cannot power off while a scan is running"))
            }
            _ => Ok(()),
        }
    }
}

/// Sends commands to the backend.
///
/// Holds only a receiver for the reconciled state: guards can read it,
/// nothing here can write it.
#[derive(Clone)]
pub struct CommandDispatcher {
    client: BackendClient,
    state: watch::Receiver<Arc<DashboardState>>,
}

impl CommandDispatcher {
    pub fn new(client: BackendClient, state: watch::Receiver<Arc<DashboardState>>) -> Self {
        Self { client, state }
    }

    /// Check and send one command. No retry; failures are returned as-is.
    pub async fn send(&self, command: Command) -> Result<CommandResult, CoreError> {
        let state = self.state.borrow().clone();
        self.send_against(command, &state).await
    }

    /// Check against `state` instead of the published state, then send.
    pub async fn send_against(
        &self,
        command: Command,
        state: &DashboardState,
    ) -> Result<CommandResult, CoreError> {
        command.check(state)?;

        let resource = command.resource();
        debug!(?command, resource, "sending command");
        match &command {
            Command::StartScan(request) => {
                self.client.start_scan(&StartScanBody::from(request)).await?;
            }
            _ => self.client.post_trigger(resource).await?,
        }
        Ok(CommandResult::Ok)
    }

    /// Fire-and-forget: send on a new task, logging failures.
    pub fn spawn(&self, command: Command) -> JoinHandle<Result<CommandResult, CoreError>> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let result = dispatcher.send(command.clone()).await;
            if let Err(ref err) = result {
                warn!(?command, error = %err, "command failed");
            }
            result
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::model::{CapabilityState, ScanOutcome};

    #[test]
    fn disabled_capability_is_rejected() {
        let state = DashboardState::default();
        for capability in Capability::ALL {
            let err = Command::for_capability(capability).check(&state).unwrap_err();
            assert!(matches!(err, CoreError::Rejected { .. }));
        }
    }

    #[test]
    fn enabled_capability_passes_regardless_of_active() {
        let mut state = DashboardState::default();
        state.light = CapabilityState::new(true, true);
        assert!(Command::ToggleLight.check(&state).is_ok());
    }

    #[test]
    fn start_scan_rejected_while_scanning() {
        let mut state = DashboardState::default();
        state.scan.is_scanning = true;
        let err = Command::StartScan(StartScanRequest::new("/mnt/a", 36))
            .check(&state)
            .unwrap_err();
        assert!(matches!(err, CoreError::Rejected { .. }));
    }

    #[test]
    fn start_scan_rejected_until_dismissed() {
        let mut state = DashboardState::default();
        state.scan.last_outcome = ScanOutcome::Success;
        assert!(Command::StartScan(StartScanRequest::new("/mnt/a", 36))
            .check(&state)
            .is_err());
    }

    #[test]
    fn start_scan_validation() {
        let state = DashboardState::default();
        let err = Command::StartScan(StartScanRequest::new("  ", 36))
            .check(&state)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { field: Some(ref f), .. } if f == "output_directory"));

        let err = Command::StartScan(StartScanRequest::new("/mnt/a", 0))
            .check(&state)
            .unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));

        assert!(Command::StartScan(StartScanRequest::new("/mnt/a", 1)).check(&state).is_ok());
    }

    #[test]
    fn stop_and_poweroff_follow_scanning() {
        let mut state = DashboardState::default();
        assert!(Command::StopScan.check(&state).is_err());
        assert!(Command::Poweroff.check(&state).is_ok());

        state.scan.is_scanning = true;
        assert!(Command::StopScan.check(&state).is_ok());
        assert!(Command::Poweroff.check(&state).is_err());
        assert!(Command::DismissAlert.check(&state).is_ok());
    }

    #[test]
    fn resources() {
        assert_eq!(Command::ToggleZoom.resource(), "focuszoom");
        assert_eq!(Command::ToggleFastForward.resource(), "fastforward");
        assert_eq!(Command::StopScan.resource(), "scan");
        assert_eq!(Command::DismissAlert.resource(), "dismiss");
        assert_eq!(Command::Poweroff.resource(), "poweroff");
    }
}
