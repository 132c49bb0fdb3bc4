//! `status`: one snapshot of the scanner, rendered.

use std::fmt::Write;

use serde::Serialize;
use tabled::Tabled;

use filmdeck_core::{Controller, DashboardState, DeviceConfig, ScanPhase, ScanProgress};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

// ── Rendering types ─────────────────────────────────────────────────

#[derive(Tabled)]
struct CapabilityRow {
    #[tabled(rename = "Capability")]
    name: &'static str,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Active")]
    active: String,
}

/// Structured form of the state, with the derived fields spelled out.
#[derive(Serialize)]
pub struct StatusReport<'a> {
    #[serde(flatten)]
    pub state: &'a DashboardState,
    #[serde(flatten)]
    pub phase: ScanPhase,
    pub progress: Option<ScanProgress>,
}

impl<'a> StatusReport<'a> {
    pub fn new(state: &'a DashboardState) -> Self {
        Self {
            state,
            phase: state.phase(),
            progress: state.scan.progress(),
        }
    }
}

pub fn phase_label(phase: ScanPhase) -> String {
    match phase {
        ScanPhase::Idle => "idle".into(),
        ScanPhase::Scanning => "scanning".into(),
        ScanPhase::Completed(outcome) => format!("completed ({outcome})"),
    }
}

/// Multi-line table view: capabilities plus the scan session.
pub fn detail(report: &StatusReport<'_>, color: bool) -> String {
    let rows: Vec<CapabilityRow> = report
        .state
        .capabilities()
        .map(|(capability, state)| CapabilityRow {
            name: capability.label(),
            enabled: output::flag(state.enabled, color),
            active: output::flag(state.active, color),
        })
        .collect();

    let mut out = output::render_table(&rows);
    let scan = &report.state.scan;
    let _ = writeln!(out);
    let _ = writeln!(out, "Scan:       {}", phase_label(report.phase));
    if let Some(progress) = report.progress {
        let _ = writeln!(
            out,
            "Progress:   {}/{} ({:.0}%)",
            progress.current,
            progress.target,
            progress.fraction() * 100.0
        );
        let _ = writeln!(out, "Remaining:  {}", scan.time_remaining);
    }
    if !scan.output_directory.is_empty() {
        let _ = writeln!(out, "Directory:  {}", scan.output_directory);
    }
    out.trim_end().to_owned()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(device: DeviceConfig, global: &GlobalOpts) -> Result<(), CliError> {
    let state =
        Controller::oneshot(device, |controller| async move { Ok(controller.state()) }).await?;

    let color = output::should_color(&global.color);
    let report = StatusReport::new(&state);
    let out = output::render_single(
        &global.output,
        &report,
        |r| detail(r, color),
        |r| phase_label(r.phase),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
